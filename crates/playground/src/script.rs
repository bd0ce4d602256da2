use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::cli::parse_duration;

/// One line of an input replay script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    /// Pointer click at DOM coordinates on the master canvas.
    Click { x: f32, y: f32 },
    Key(String),
    GlobalClick,
    ContextMenu,
    /// Raw mode name; unknown names are left for the controller to reject.
    Mode(String),
    CursorSize { width: f32, height: f32 },
    /// Browser-window resize; an explicit size is applied to every card once
    /// the resize burst settles.
    Viewport { size: Option<(u32, u32)> },
    /// Loads one more shader by base name and appends its card.
    Add(String),
    /// Drops the card whose title or base name matches.
    Remove(String),
    /// Tears every card down and rebuilds from freshly read files.
    Reload,
    Wait(Duration),
}

pub fn parse_script(input: &str) -> Result<Vec<ScriptEvent>> {
    let mut events = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = parse_line(line).with_context(|| format!("line {}: '{line}'", index + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn parse_line(line: &str) -> Result<ScriptEvent> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let event = match (verb, args.as_slice()) {
        ("click", [x, y]) => ScriptEvent::Click {
            x: parse_number(x)?,
            y: parse_number(y)?,
        },
        ("key", [name]) => ScriptEvent::Key((*name).to_string()),
        ("global-click", []) => ScriptEvent::GlobalClick,
        ("context-menu", []) => ScriptEvent::ContextMenu,
        ("mode", [name]) => ScriptEvent::Mode((*name).to_string()),
        ("cursor-size", [width, height]) => ScriptEvent::CursorSize {
            width: parse_number(width)?,
            height: parse_number(height)?,
        },
        ("viewport", []) => ScriptEvent::Viewport { size: None },
        ("viewport", [width, height]) => ScriptEvent::Viewport {
            size: Some((parse_dimension(width)?, parse_dimension(height)?)),
        },
        ("add", [name]) => ScriptEvent::Add((*name).to_string()),
        ("remove", words @ [_, ..]) => ScriptEvent::Remove(words.join(" ")),
        ("reload", []) => ScriptEvent::Reload,
        ("wait", [duration]) => ScriptEvent::Wait(parse_duration(duration).map_err(|err| anyhow!(err))?),
        (
            "click" | "key" | "global-click" | "context-menu" | "mode" | "cursor-size" | "viewport"
            | "add" | "remove" | "reload" | "wait",
            _,
        ) => bail!("wrong number of arguments for '{verb}'"),
        _ => bail!("unknown event '{verb}'"),
    };
    Ok(event)
}

fn parse_number(raw: &str) -> Result<f32> {
    let value: f32 = raw
        .parse()
        .map_err(|_| anyhow!("'{raw}' is not a number"))?;
    if !value.is_finite() {
        bail!("'{raw}' is not a finite number");
    }
    Ok(value)
}

fn parse_dimension(raw: &str) -> Result<u32> {
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => bail!("'{raw}' is not a positive pixel size"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_event_kind() {
        let script = r#"
# warm up
mode auto
wait 1500ms
global-click
context-menu
click 10 20.5
key ArrowUp
cursor-size 4 40
viewport
viewport 640 480
add cursor_rainbow
remove Digital Dissolve
reload
"#;
        let events = parse_script(script).unwrap();
        assert_eq!(
            events,
            vec![
                ScriptEvent::Mode("auto".into()),
                ScriptEvent::Wait(Duration::from_millis(1500)),
                ScriptEvent::GlobalClick,
                ScriptEvent::ContextMenu,
                ScriptEvent::Click { x: 10.0, y: 20.5 },
                ScriptEvent::Key("ArrowUp".into()),
                ScriptEvent::CursorSize {
                    width: 4.0,
                    height: 40.0
                },
                ScriptEvent::Viewport { size: None },
                ScriptEvent::Viewport {
                    size: Some((640, 480))
                },
                ScriptEvent::Add("cursor_rainbow".into()),
                ScriptEvent::Remove("Digital Dissolve".into()),
                ScriptEvent::Reload,
            ]
        );
    }

    #[test]
    fn unknown_modes_parse_for_later_rejection() {
        let events = parse_script("mode bogus").unwrap();
        assert_eq!(events, vec![ScriptEvent::Mode("bogus".into())]);
    }

    #[test]
    fn errors_name_the_line() {
        let err = parse_script("key Enter\nclick 1").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains("wrong number of arguments"), "{message}");

        assert!(parse_script("jump 1 2").is_err());
        assert!(parse_script("click a 2").is_err());
        assert!(parse_script("click NaN 2").is_err());
        assert!(parse_script("viewport 0 480").is_err());
        assert!(parse_script("reload now").is_err());
    }
}
