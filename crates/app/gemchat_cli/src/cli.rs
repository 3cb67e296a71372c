//! Command-line arguments.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Base URL of the Gemchat server.
    #[arg(
        long,
        global = true,
        env = "GEMCHAT_SERVER",
        default_value = "http://127.0.0.1:3000"
    )]
    pub server: String,

    /// Account email.
    #[arg(long, global = true, env = "GEMCHAT_EMAIL")]
    pub email: Option<String>,

    /// Account password.
    #[arg(long, global = true, env = "GEMCHAT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat. `/clear` empties the history, `/quit` exits.
    #[clap(alias = "i")]
    Chat,

    /// Send one message and print the reply.
    Send {
        /// The message to send.
        message: String,
    },

    /// Print the stored history.
    History,

    /// Delete the stored history.
    Clear,

    /// Print the version.
    Version,
}
