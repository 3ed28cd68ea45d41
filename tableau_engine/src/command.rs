//! Command module
//!
//! Describes the console commands that drive a running world.
use variantly;

/// Commands that can be issued at the console.
#[derive(Debug, Clone, PartialEq, variantly::Variantly)]
pub enum Command {
    /// Cancel a running verb, by its number in the `running` list.
    Cancel(usize),
    Choose(usize),
    /// Interact with whatever is under a scene point.
    Click {
        x: f32,
        y: f32,
        verb: String,
    },
    /// The front end finished an animation on an actor.
    AnimationDone(String),
    Do {
        verb: String,
        actor: String,
        target: Option<String>,
    },
    Help,
    ListSaves,
    Load(String),
    Look,
    Quit,
    Running,
    Save(String),
    Scene(String),
    Tick(Option<f32>),
    Unknown,
    Verbs(String),
    Wait(f32),
    Walk {
        x: f32,
        y: f32,
    },
}

/// Parses an input string and returns a corresponding `Command` if recognized.
pub fn parse_command(input: &str) -> Command {
    let words: Vec<&str> = input.split_whitespace().collect();
    match words.as_slice() {
        ["look" | "l" | "actors"] => Command::Look,
        ["verbs", actor] => Command::Verbs((*actor).to_string()),
        ["do", verb, actor] => Command::Do {
            verb: (*verb).to_string(),
            actor: (*actor).to_string(),
            target: None,
        },
        ["do", verb, actor, "with" | "on" | "using", target] => Command::Do {
            verb: (*verb).to_string(),
            actor: (*actor).to_string(),
            target: Some((*target).to_string()),
        },
        ["walk" | "go", x, y] => match (x.parse(), y.parse()) {
            (Ok(x), Ok(y)) => Command::Walk { x, y },
            _ => Command::Unknown,
        },
        ["click", x, y] | ["click", x, y, _] => match (x.parse(), y.parse()) {
            (Ok(x), Ok(y)) => Command::Click {
                x,
                y,
                verb: words.get(3).map_or("lookat", |verb| *verb).to_string(),
            },
            _ => Command::Unknown,
        },
        ["tick"] => Command::Tick(None),
        ["tick", secs] => secs.parse().map_or(Command::Unknown, |s| Command::Tick(Some(s))),
        ["wait", secs] => secs
            .parse::<f32>()
            .ok()
            .filter(|s| *s >= 0.0)
            .map_or(Command::Unknown, Command::Wait),
        ["choose" | "say", n] => parse_ordinal(n).map_or(Command::Unknown, Command::Choose),
        ["done", actor] => Command::AnimationDone((*actor).to_string()),
        ["scene", id] => Command::Scene((*id).to_string()),
        ["running" | "ps"] => Command::Running,
        ["cancel", n] => parse_ordinal(n).map_or(Command::Unknown, Command::Cancel),
        ["save", slot] => Command::Save((*slot).to_string()),
        ["load", slot] => Command::Load((*slot).to_string()),
        ["saves"] | ["load"] => Command::ListSaves,
        ["help" | "?"] => Command::Help,
        ["quit" | "exit"] => Command::Quit,
        _ => Command::Unknown,
    }
}

// 1-based on screen, 0-based here
fn parse_ordinal(word: &str) -> Option<usize> {
    word.parse::<usize>().ok().and_then(|n| n.checked_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verb_with_and_without_target() {
        assert_eq!(
            parse_command("do open door"),
            Command::Do {
                verb: "open".into(),
                actor: "door".into(),
                target: None
            }
        );
        assert_eq!(
            parse_command("  do use key with door "),
            Command::Do {
                verb: "use".into(),
                actor: "key".into(),
                target: Some("door".into())
            }
        );
    }

    #[test]
    fn numbers_are_checked() {
        assert_eq!(parse_command("walk 10 20.5"), Command::Walk { x: 10.0, y: 20.5 });
        assert_eq!(parse_command("walk ten 20"), Command::Unknown);
        assert_eq!(
            parse_command("click 3 4"),
            Command::Click {
                x: 3.0,
                y: 4.0,
                verb: "lookat".into()
            }
        );
        assert_eq!(parse_command("wait -1"), Command::Unknown);
        assert_eq!(parse_command("tick"), Command::Tick(None));
        assert_eq!(parse_command("tick 0.5"), Command::Tick(Some(0.5)));
    }

    #[test]
    fn ordinals_are_one_based() {
        assert_eq!(parse_command("choose 1"), Command::Choose(0));
        assert_eq!(parse_command("choose 0"), Command::Unknown);
        assert!(parse_command("cancel 2").is_cancel());
    }

    #[test]
    fn unknown_input() {
        assert_eq!(parse_command("dance wildly now please"), Command::Unknown);
        assert_eq!(parse_command(""), Command::Unknown);
    }
}
