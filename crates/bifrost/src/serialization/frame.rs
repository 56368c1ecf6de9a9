use std::{fmt, io::Write, str::FromStr, str::Split, time::Duration};

use super::{Decode, Encode};
use crate::{
    communication::{
        BallPosition, Freshness, Message, MessageKind, PositionReport, StateReport,
    },
    Error, Result,
};

/// Separator between the fields of a frame.
pub const SEPARATOR: char = '|';

/// Cursor over the fields of a frame that follow the type tag.
struct Fields<'a> {
    tag: &'static str,
    rest: Split<'a, char>,
}

impl<'a> Fields<'a> {
    fn required(&mut self, field: &'static str) -> Result<&'a str> {
        self.rest
            .next()
            .map(str::trim)
            .ok_or(Error::MissingField {
                tag: self.tag,
                field,
            })
    }

    fn parse<T: FromStr>(&mut self, field: &'static str) -> Result<T> {
        let tag = self.tag;
        let value = self.required(field)?;

        value.parse().map_err(|_| Error::InvalidField {
            tag,
            field,
            value: value.to_owned(),
        })
    }

    fn optional<T: FromStr>(&mut self, field: &'static str) -> Result<Option<T>> {
        let tag = self.tag;
        match self.rest.next().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| Error::InvalidField {
                tag,
                field,
                value: value.to_owned(),
            }),
        }
    }

    fn number(&mut self, field: &'static str) -> Result<f32> {
        let value: f32 = self.parse(field)?;
        self.finite(field, value)
    }

    fn optional_number(&mut self, field: &'static str) -> Result<Option<f32>> {
        self.optional::<f32>(field)?
            .map(|value| self.finite(field, value))
            .transpose()
    }

    fn duration(&mut self, field: &'static str) -> Result<Duration> {
        let secs = self.number(field)?;

        Duration::try_from_secs_f32(secs).map_err(|_| Error::InvalidField {
            tag: self.tag,
            field,
            value: secs.to_string(),
        })
    }

    fn finite(&self, field: &'static str, value: f32) -> Result<f32> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::InvalidField {
                tag: self.tag,
                field,
                value: value.to_string(),
            })
        }
    }

    /// Makes sure nothing but empty fields remain.
    fn finish(self) -> Result<()> {
        let count = self.rest.filter(|field| !field.trim().is_empty()).count();

        if count == 0 {
            Ok(())
        } else {
            Err(Error::TrailingFields {
                tag: self.tag,
                count,
            })
        }
    }
}

impl Decode for Message {
    fn decode(frame: &str) -> Result<Self> {
        let frame = frame.trim();
        if frame.is_empty() {
            return Err(Error::EmptyFrame);
        }

        let mut parts = frame.split(SEPARATOR);
        let tag = parts.next().unwrap_or_default().trim();
        let kind = MessageKind::from_str(tag).map_err(|_| Error::UnknownTag(tag.to_owned()))?;

        let mut fields = Fields {
            tag: kind.tag(),
            rest: parts,
        };

        let message = match kind {
            MessageKind::Setup => Message::Setup {
                team: fields.parse("team")?,
                agent: fields.parse("agent_id")?,
            },
            MessageKind::Add => Message::Add {
                team: fields.parse("team")?,
                agent: fields.parse("agent_id")?,
            },
            MessageKind::Info => Message::Info {
                agent: fields.parse("agent_id")?,
                team: fields.optional("team")?,
            },
            MessageKind::Role => Message::Role {
                agent: fields.parse("agent_id")?,
                role: fields.parse("role")?,
            },
            MessageKind::State => {
                let agent = fields.parse("agent_id")?;
                let motion_state = fields.parse("motion_state")?;
                let x = fields.number("x")?;
                let y = fields.number("y")?;
                let heading = fields.number("heading")?;

                let freshness = match fields.optional_number("timestamp")? {
                    Some(timestamp) => Some(Freshness {
                        timestamp,
                        tolerance: fields.number("delay_tolerance")?,
                    }),
                    None => None,
                };

                Message::State(StateReport {
                    agent,
                    motion_state,
                    x,
                    y,
                    heading,
                    freshness,
                })
            }
            MessageKind::Position => Message::Position(PositionReport {
                agent: fields.parse("agent_id")?,
                x: fields.number("x")?,
                y: fields.number("y")?,
                heading: fields.number("heading")?,
            }),
            MessageKind::Ball => Message::Ball(BallPosition {
                x: fields.number("x")?,
                y: fields.number("y")?,
                z: fields.number("z")?,
            }),
            MessageKind::Revert => Message::Revert {
                duration: fields.duration("duration")?,
            },
            MessageKind::Reset => Message::Reset,
            MessageKind::Ack => Message::Ack {
                agent: fields.parse("agent_id")?,
            },
            MessageKind::Leave => Message::Leave {
                agent: fields.parse("agent_id")?,
            },
            MessageKind::Start => Message::Start {
                setup: fields.duration("setup")?,
            },
        };

        fields.finish()?;
        Ok(message)
    }
}

impl FromStr for Message {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())?;

        match self {
            Message::Setup { team, agent } | Message::Add { team, agent } => {
                write!(f, "|{team}|{agent}")
            }
            Message::Info { agent, team } => {
                write!(f, "|{agent}")?;
                if let Some(team) = team {
                    write!(f, "|{team}")?;
                }
                Ok(())
            }
            Message::Role { agent, role } => write!(f, "|{agent}|{role}"),
            Message::State(report) => {
                write!(
                    f,
                    "|{}|{}|{:.3}|{:.3}|{:.3}",
                    report.agent, report.motion_state, report.x, report.y, report.heading
                )?;
                if let Some(freshness) = report.freshness {
                    write!(f, "|{:.3}|{:.3}", freshness.timestamp, freshness.tolerance)?;
                }
                Ok(())
            }
            Message::Position(report) => write!(
                f,
                "|{}|{:.3}|{:.3}|{:.3}",
                report.agent, report.x, report.y, report.heading
            ),
            Message::Ball(ball) => write!(f, "|{:.3}|{:.3}|{:.3}", ball.x, ball.y, ball.z),
            Message::Revert { duration } => write!(f, "|{:.3}", duration.as_secs_f32()),
            Message::Reset => Ok(()),
            Message::Ack { agent } | Message::Leave { agent } => write!(f, "|{agent}"),
            Message::Start { setup } => write!(f, "|{:.3}", setup.as_secs_f32()),
        }
    }
}

impl Encode for Message {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        writeln!(write, "{self}")?;
        Ok(())
    }

    fn encode_len(&self) -> usize {
        self.to_string().len() + 1
    }
}
