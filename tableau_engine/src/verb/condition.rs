//! Predicates evaluated by `Conditional` actions.

use super::{ActionContext, Target};

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// The entity's state string equals `state` (`None` matches "no state").
    StateIs { target: Target, state: Option<String> },
    /// The entity's custom property equals `value` (`None` matches "unset").
    PropertyIs {
        target: Target,
        name: String,
        value: Option<String>,
    },
    Visible { actor: Option<String> },
    PlayerInside { actor: Option<String> },
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    /// Evaluate against the world seen by the running verb.
    ///
    /// # Errors
    /// - if an entity named by the condition does not exist
    pub fn eval(&self, ctx: &ActionContext<'_>) -> Result<bool> {
        Ok(match self {
            Condition::StateIs { target, state } => {
                let owner = ctx.resolve_target(target)?;
                ctx.world.state_of(&owner)? == state.as_deref()
            },
            Condition::PropertyIs { target, name, value } => {
                let owner = ctx.resolve_target(target)?;
                ctx.world.property_of(&owner, name)? == value.as_deref()
            },
            Condition::Visible { actor } => ctx.actor(actor.as_deref())?.visible,
            Condition::PlayerInside { actor } => ctx.actor(actor.as_deref())?.player_inside,
            Condition::Not(inner) => !inner.eval(ctx)?,
            Condition::All(list) => {
                for cond in list {
                    if !cond.eval(ctx)? {
                        return Ok(false);
                    }
                }
                true
            },
            Condition::Any(list) => {
                for cond in list {
                    if cond.eval(ctx)? {
                        return Ok(true);
                    }
                }
                false
            },
        })
    }
}
