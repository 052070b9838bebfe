//! Command-line parsing.
//!
//! The tool keeps its historical single-dash syntax (`-cin 0 -din 0 ...`).
//! Every recognized flag consumes the next token as its value. Unknown tokens
//! are skipped, and what happened to each field is recorded in the result
//! instead of being silently dropped.

use thiserror::Error;

use pcm_feedback_core::models::audio_models::{DeviceId, PcmFormat};
use pcm_feedback_core::models::config::SessionConfig;

/// Fewer arguments than this (excluding the program name) is a usage error.
pub const MIN_ARGS: usize = 4;

const DEFAULT_BITS: u32 = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("expected at least 4 arguments, got {0}")]
    Usage(usize),

    #[error("{0} bits is not supported.")]
    UnsupportedBitDepth(u32),
}

/// A recognized flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    InputCard,
    InputDevice,
    OutputCard,
    OutputDevice,
    Channels,
    Rate,
    Bits,
    PeriodSize,
    PeriodCount,
}

impl Flag {
    pub const ALL: [Flag; 9] = [
        Flag::InputCard,
        Flag::InputDevice,
        Flag::OutputCard,
        Flag::OutputDevice,
        Flag::Channels,
        Flag::Rate,
        Flag::Bits,
        Flag::PeriodSize,
        Flag::PeriodCount,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Flag::InputCard => "-cin",
            Flag::InputDevice => "-din",
            Flag::OutputCard => "-cout",
            Flag::OutputDevice => "-dout",
            Flag::Channels => "-c",
            Flag::Rate => "-r",
            Flag::Bits => "-b",
            Flag::PeriodSize => "-p",
            Flag::PeriodCount => "-n",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.token() == token)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// What the parser did with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    /// Never given; the default applies.
    Defaulted,
    /// Last occurrence carried this value.
    Set(u32),
    /// The flag was the last token and had no value. The prior value applies.
    Missing,
    /// The value was not an unsigned integer. The prior value applies.
    Malformed(String),
}

impl FieldStatus {
    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Missing | Self::Malformed(_))
    }
}

/// Result of parsing the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub config: SessionConfig,
    fields: [FieldStatus; 9],
    /// Tokens that were not a recognized flag, in order.
    pub ignored: Vec<String>,
}

impl ParsedArgs {
    pub fn status(&self, flag: Flag) -> &FieldStatus {
        &self.fields[flag.index()]
    }

    /// Flags whose last occurrence was missing or malformed.
    pub fn problems(&self) -> impl Iterator<Item = (Flag, &FieldStatus)> + '_ {
        Flag::ALL
            .into_iter()
            .map(move |f| (f, self.status(f)))
            .filter(|(_, s)| s.is_problem())
    }

    /// Warn about everything the parser skipped or could not use.
    pub fn log_problems(&self) {
        for token in &self.ignored {
            log::warn!("Ignoring unrecognized argument {:?}", token);
        }
        for (flag, status) in self.problems() {
            match status {
                FieldStatus::Missing => {
                    log::warn!("{} has no value; keeping previous value", flag.token())
                }
                FieldStatus::Malformed(v) => log::warn!(
                    "{} value {:?} is not a number; keeping previous value",
                    flag.token(),
                    v
                ),
                _ => {}
            }
        }
    }
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {} -cin inputcard -din inputdevice -cout outputcard -dout outputdevice \
         [-c channels] [-r rate] [-b bits] [-p period_size] [-n n_periods]",
        program
    )
}

/// Parse the arguments that follow the program name.
pub fn parse<I, S>(args: I) -> Result<ParsedArgs, ArgsError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
    if tokens.len() < MIN_ARGS {
        return Err(ArgsError::Usage(tokens.len()));
    }

    let defaults = SessionConfig::default();
    let mut values = [
        defaults.input.card,
        defaults.input.device,
        defaults.output.card,
        defaults.output.device,
        defaults.channels,
        defaults.rate,
        DEFAULT_BITS,
        defaults.period_size,
        defaults.period_count,
    ];
    let mut fields: [FieldStatus; 9] = std::array::from_fn(|_| FieldStatus::Defaulted);
    let mut ignored = Vec::new();

    let mut rest = tokens.into_iter();
    while let Some(token) = rest.next() {
        let Some(flag) = Flag::from_token(&token) else {
            ignored.push(token);
            continue;
        };
        fields[flag.index()] = match rest.next() {
            None => FieldStatus::Missing,
            Some(value) => match value.parse::<u32>() {
                Ok(v) => {
                    values[flag.index()] = v;
                    FieldStatus::Set(v)
                }
                Err(_) => FieldStatus::Malformed(value),
            },
        };
    }

    let bits = values[Flag::Bits.index()];
    let format = PcmFormat::from_bits(bits).ok_or(ArgsError::UnsupportedBitDepth(bits))?;

    let config = SessionConfig {
        input: DeviceId::new(
            values[Flag::InputCard.index()],
            values[Flag::InputDevice.index()],
        ),
        output: DeviceId::new(
            values[Flag::OutputCard.index()],
            values[Flag::OutputDevice.index()],
        ),
        channels: values[Flag::Channels.index()],
        rate: values[Flag::Rate.index()],
        format,
        period_size: values[Flag::PeriodSize.index()],
        period_count: values[Flag::PeriodCount.index()],
    };

    Ok(ParsedArgs {
        config,
        fields,
        ignored,
    })
}
