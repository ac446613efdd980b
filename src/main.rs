//! ghostcode CLI
//!
//! Command-line front end for transcoding and codec inspection.
//! Options take a single dash (`-input movie.mkv`); `--input` works too.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use ghostcode::{
    codecs::{format_listing, CodecKind},
    HwAccel, TranscodeConfig, Transcoder,
};
use std::path::PathBuf;

/// Every long option, for single-dash normalization
const OPTION_NAMES: &[&str] = &[
    "help",
    "input",
    "output",
    "swdecoders",
    "swencoders",
    "hwdecoders",
    "hwencoders",
    "hwaccels",
    "decoder",
    "encoder",
    "hwaccel",
    "config",
    "version",
];

/// Options that consume the following token as their value
const VALUE_OPTIONS: &[&str] = &["input", "output", "decoder", "encoder", "hwaccel", "config"];

#[derive(Parser, Debug)]
#[command(name = "ghostcode")]
#[command(about = "FFmpeg video transcoder - Decode, Copy, Encode")]
#[command(version, disable_help_flag = true)]
struct Cli {
    /// prints this message
    #[arg(long)]
    help: bool,

    /// input file path
    #[arg(long, value_name = "file_path")]
    input: Option<PathBuf>,

    /// output file (default: <input>_out<ext>)
    #[arg(long, value_name = "file_path")]
    output: Option<PathBuf>,

    /// lists all registered software decoders
    #[arg(long)]
    swdecoders: bool,

    /// lists all registered software encoders
    #[arg(long)]
    swencoders: bool,

    /// lists all registered hardware decoders
    #[arg(long)]
    hwdecoders: bool,

    /// lists all registered hardware encoders
    #[arg(long)]
    hwencoders: bool,

    /// lists hardware acceleration methods available for decoding
    #[arg(long)]
    hwaccels: bool,

    /// use selected decoder
    #[arg(long, value_name = "decoder_name")]
    decoder: Option<String>,

    /// use selected encoder
    #[arg(long, value_name = "encoder_name")]
    encoder: Option<String>,

    /// use selected hardware decoding method
    #[arg(long, value_name = "hwaccel_name")]
    hwaccel: Option<String>,

    /// TOML file with default transcode settings
    #[arg(long, value_name = "file_path")]
    config: Option<PathBuf>,
}

/// What a command line asks for; the first match wins
#[derive(Debug, PartialEq)]
enum Action {
    Help,
    ListCodecs { kind: CodecKind, hardware: bool },
    ListHwAccels,
    Transcode(TranscodeConfig),
}

impl Cli {
    fn has_options(&self) -> bool {
        self.help
            || self.input.is_some()
            || self.output.is_some()
            || self.swdecoders
            || self.swencoders
            || self.hwdecoders
            || self.hwencoders
            || self.hwaccels
            || self.decoder.is_some()
            || self.encoder.is_some()
            || self.hwaccel.is_some()
            || self.config.is_some()
    }

    fn action(self) -> anyhow::Result<Action> {
        if !self.has_options() || self.help {
            return Ok(Action::Help);
        }

        let listing = [
            (self.swdecoders, CodecKind::Decoder, false),
            (self.swencoders, CodecKind::Encoder, false),
            (self.hwdecoders, CodecKind::Decoder, true),
            (self.hwencoders, CodecKind::Encoder, true),
        ];
        if let Some((_, kind, hardware)) = listing.into_iter().find(|(set, _, _)| *set) {
            return Ok(Action::ListCodecs { kind, hardware });
        }

        if self.hwaccels {
            return Ok(Action::ListHwAccels);
        }

        let Some(input) = self.input else {
            return Ok(Action::Help);
        };

        let mut config = match &self.config {
            Some(path) => TranscodeConfig::from_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TranscodeConfig::default(),
        };
        config = config.with_input(input);

        if let Some(output) = self.output {
            config = config.with_output(output);
        }
        if let Some(decoder) = self.decoder {
            config = config.with_decoder(decoder);
        }
        if let Some(encoder) = self.encoder {
            config = config.with_encoder(encoder);
        }
        if let Some(name) = self.hwaccel {
            config = config.with_hwaccel(name.parse::<HwAccel>()?);
        }

        Ok(Action::Transcode(config))
    }
}

/// Rewrite `-name` to `--name` for known options.
///
/// Parsing stops at the first token that is neither a known option nor an
/// option's value (or at `--`); that token and everything after it are
/// dropped, so the options before it still apply.
fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut normalized: Vec<String> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        let Some(rest) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
            break;
        };
        let (name, inline_value) = match rest.split_once('=') {
            Some((name, _)) => (name, true),
            None => (rest, false),
        };
        if !OPTION_NAMES.contains(&name) {
            break;
        }

        if VALUE_OPTIONS.contains(&name) && !inline_value {
            // Joined so clap accepts values that start with a dash
            match args.next() {
                Some(value) => normalized.push(format!("--{}={}", name, value)),
                None => {
                    normalized.push(format!("--{}", name));
                    break;
                }
            }
        } else {
            normalized.push(format!("--{}", rest));
        }
    }

    normalized
}

fn main() -> anyhow::Result<()> {
    // Initialize logging (stderr, so listings stay clean on stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ghostcode=info".parse()?),
        )
        .init();

    let args = normalize_args(std::env::args());

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            tracing::debug!("Invalid arguments: {}", e);
            return cmd_help();
        }
    };

    match cli.action()? {
        Action::Help => cmd_help(),
        Action::ListCodecs { kind, hardware } => cmd_list_codecs(kind, hardware),
        Action::ListHwAccels => cmd_list_hwaccels(),
        Action::Transcode(config) => cmd_transcode(config),
    }
}

fn cmd_help() -> anyhow::Result<()> {
    Cli::command().print_help()?;
    println!();
    Ok(())
}

fn cmd_list_codecs(kind: CodecKind, hardware: bool) -> anyhow::Result<()> {
    let names = ghostcode::codec_names(kind, hardware)?;
    println!("{}", format_listing(&names));
    Ok(())
}

fn cmd_list_hwaccels() -> anyhow::Result<()> {
    let names: Vec<String> = ghostcode::available_hwaccels()?
        .iter()
        .map(|accel| accel.to_string())
        .collect();
    println!("{}", format_listing(&names));
    Ok(())
}

fn cmd_transcode(config: TranscodeConfig) -> anyhow::Result<()> {
    let transcoder = Transcoder::new(config);

    println!(
        "Transcoding '{}' to '{}'...",
        transcoder.config().input.display(),
        transcoder.output_path().display()
    );
    println!();

    let stats = transcoder.run()?;

    println!();
    println!("{}", stats.summary());

    Ok(())
}
