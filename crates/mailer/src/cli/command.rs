//! Command-line parsing for the interactive surface.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Stats,
    Templates,
    Send {
        to: String,
        template: String,
        variables: HashMap<String, String>,
    },
    Campaign {
        name: String,
        template: String,
        recipients: Vec<String>,
    },
    Progress(u64),
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Unknown(String),
    Usage(&'static str),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Empty);
        };

        match head {
            "help" | "?" => Ok(Command::Help),
            "status" => Ok(Command::Status),
            "stats" => Ok(Command::Stats),
            "templates" => Ok(Command::Templates),
            "quit" | "exit" => Ok(Command::Quit),
            "send" => {
                const USAGE: &str = "send <to> <template> [key=value ...]";
                let to = words.next().ok_or(ParseError::Usage(USAGE))?.to_string();
                let template = words.next().ok_or(ParseError::Usage(USAGE))?.to_string();
                let variables = words
                    .map(|pair| {
                        pair.split_once('=')
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .ok_or(ParseError::Usage(USAGE))
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Command::Send {
                    to,
                    template,
                    variables,
                })
            }
            "campaign" => {
                const USAGE: &str = "campaign <name> <template> <to> [to ...]";
                let name = words.next().ok_or(ParseError::Usage(USAGE))?.to_string();
                let template = words.next().ok_or(ParseError::Usage(USAGE))?.to_string();
                let recipients: Vec<String> = words.map(str::to_string).collect();
                if recipients.is_empty() {
                    return Err(ParseError::Usage(USAGE));
                }
                Ok(Command::Campaign {
                    name,
                    template,
                    recipients,
                })
            }
            "progress" => words
                .next()
                .and_then(|id| id.parse().ok())
                .map(Command::Progress)
                .ok_or(ParseError::Usage("progress <campaign id>")),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}
