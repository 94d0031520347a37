// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use lexicards_core::error::Fallible;
use tokio::spawn;

use crate::cmd::cards::add_card;
use crate::cmd::cards::answer;
use crate::cmd::cards::delete_card;
use crate::cmd::cards::delete_user;
use crate::cmd::cards::list_due;
use crate::cmd::cards::search;
use crate::cmd::open_engine;
use crate::cmd::serve::server::ServerConfig;
use crate::cmd::serve::server::start_server;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::config::AppConfig;
use crate::utils::wait_for_server;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API.
    Serve {
        /// Path to the database. Overrides the configuration file.
        #[arg(long)]
        db: Option<PathBuf>,
        /// The host address to bind to. Default is 127.0.0.1.
        #[arg(long)]
        host: Option<String>,
        /// The port to use for the web server. Default is 8000.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Add a card.
    Add {
        #[arg(long)]
        user: String,
        /// The word or phrase to learn.
        word: String,
        #[arg(long)]
        translation: Option<String>,
        /// An example sentence. May be repeated.
        #[arg(long)]
        context: Vec<String>,
    },
    /// List the cards due now.
    Due {
        #[arg(long)]
        user: String,
    },
    /// Record an answer to a card.
    Answer {
        #[arg(long)]
        user: String,
        /// The card id.
        id: i64,
        /// 1 (again), 2 (hard), 3 (good), 4 (easy) or 5 (perfect).
        rating: i64,
    },
    /// Print card statistics.
    Stats {
        #[arg(long)]
        user: String,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Search cards by word or translation.
    Search {
        #[arg(long)]
        user: String,
        query: String,
    },
    /// Delete a card.
    Delete {
        #[arg(long)]
        user: String,
        id: i64,
    },
    /// Delete a user and all of their cards.
    DeleteUser {
        #[arg(long)]
        user: String,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Serve { db, host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let engine = open_engine(&config, db)?;
            let announce_host = host.clone();
            spawn(async move {
                if wait_for_server(&announce_host, port).await.is_ok() {
                    println!("Serving on http://{announce_host}:{port}/");
                }
            });
            start_server(ServerConfig { host, port, engine }).await
        }
        Command::Add {
            user,
            word,
            translation,
            context,
        } => add_card(&open_engine(&config, None)?, user, word, translation, context),
        Command::Due { user } => list_due(&open_engine(&config, None)?, user),
        Command::Answer { user, id, rating } => {
            answer(&open_engine(&config, None)?, user, id, rating)
        }
        Command::Stats { user, format } => print_stats(&open_engine(&config, None)?, user, format),
        Command::Search { user, query } => search(&open_engine(&config, None)?, user, query),
        Command::Delete { user, id } => delete_card(&open_engine(&config, None)?, user, id),
        Command::DeleteUser { user } => delete_user(&open_engine(&config, None)?, user),
    }
}
