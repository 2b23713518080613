//! Subcommand definitions.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read text aloud
    Speak {
        /// Text to speak (reads --file or stdin when omitted)
        text: Option<String>,

        /// Read the text from a file
        #[arg(short = 'f', long = "file", conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Voice for this playback (overrides the default voice)
        #[arg(long = "with-voice")]
        with_voice: Option<String>,

        /// Document id to save reading progress under
        #[arg(short = 'd', long = "document")]
        document: Option<String>,

        /// Play to the end without reading controls from stdin
        #[arg(long = "no-controls")]
        no_controls: bool,
    },

    /// Validate settings and show which engine would be used
    Check,
}
