use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "askdocs", version, about = "Ask questions about your text documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Inspect the upload directory
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Store a local .txt file and print its identifier
    Upload {
        path: String,
    },

    /// Ask a single question about uploaded files
    Ask {
        /// Identifier of an uploaded file (repeatable)
        #[arg(short, long = "file", required = true)]
        files: Vec<String>,
        question: String,
    },

    /// Enter interactive question REPL mode over uploaded files
    Chat {
        /// Identifier of an uploaded file (repeatable)
        #[arg(short, long = "file", required = true)]
        files: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum FilesAction {
    /// List stored documents
    List,
}
