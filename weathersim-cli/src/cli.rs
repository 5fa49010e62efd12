use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Text};
use rand::Rng;
use std::io::{self, BufRead, IsTerminal, Write};
use weathersim_core::{Config, ResolverId, Simulator, resolver_from_config};

const PROMPT: &str =
    "Press Y for an iteration of Weather Simulated Date, Else Press anykey to Exit";
const CRASH_MESSAGE: &str = "We just crashed, Please try again";
const FAREWELL: &str = "Thank you for using  the Simulator!!!";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weathersim", version, about = "Synthetic weather observation generator")]
pub struct Cli {
    /// Resolver to use instead of the configured default ("open-meteo" or "google").
    #[arg(long, global = true)]
    pub resolver: Option<String>,

    /// Comma-separated list of cities overriding the configured list.
    #[arg(long, global = true, value_delimiter = ',')]
    pub cities: Vec<String>,

    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Prompt for Y before each batch; any other answer exits.
    Run,

    /// Generate batches without prompting.
    Batch {
        /// Number of batches to generate.
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Print the cities a batch would cover.
    Cities,

    /// Configure credentials for a specific resolver.
    Configure {
        /// Resolver short name, e.g. "google" or "open-meteo".
        resolver: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let Cli { resolver, cities, command } = self;

        match command.unwrap_or(Command::Run) {
            Command::Run => {
                let config = effective_config(cities)?;
                let simulator = build_simulator(&config, resolver.as_deref())?;
                let mut prompter = if io::stdin().is_terminal() {
                    Prompter::Terminal
                } else {
                    Prompter::Lines(io::stdin().lock())
                };
                interactive(&simulator, &mut prompter, &mut io::stdout(), &mut rand::rng()).await?;
            }
            Command::Batch { count } => {
                let config = effective_config(cities)?;
                let simulator = build_simulator(&config, resolver.as_deref())?;
                let mut rng = rand::rng();
                for _ in 0..count {
                    simulator.run_batch(&mut io::stdout().lock(), &mut rng).await?;
                }
            }
            Command::Cities => {
                for city in effective_config(cities)?.city_list() {
                    println!("{city}");
                }
            }
            Command::Configure { resolver } => {
                configure(&resolver, Config::load()?)?;
            }
        }

        Ok(())
    }
}

/// Config from disk with the `--cities` override applied. The override is
/// never written back.
fn effective_config(cities: Vec<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if !cities.is_empty() {
        config.cities = cities;
    }
    Ok(config)
}

fn build_simulator(config: &Config, resolver: Option<&str>) -> Result<Simulator> {
    let id = match resolver {
        Some(name) => ResolverId::try_from(name)?,
        None => config.default_resolver_id()?,
    };

    tracing::debug!(resolver = %id, "building simulator");

    let resolver = resolver_from_config(id, config)?;
    Ok(Simulator::new(config.city_list(), resolver))
}

/// Only an exact `Y` or `y` runs another batch.
fn is_affirmative(answer: &str) -> bool {
    matches!(answer, "Y" | "y")
}

/// Where interactive answers come from: inquire on a terminal, plain lines
/// when stdin is piped.
enum Prompter<R> {
    Terminal,
    Lines(R),
}

impl<R: BufRead> Prompter<R> {
    /// Next answer, or `None` once input is exhausted or the prompt was aborted.
    fn ask<W: Write>(&mut self, out: &mut W) -> Result<Option<String>> {
        match self {
            Prompter::Terminal => Ok(Text::new(PROMPT).prompt().ok()),
            Prompter::Lines(input) => {
                writeln!(out, "{PROMPT}")?;
                out.flush()?;

                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
            }
        }
    }
}

async fn interactive<R, W, G>(
    simulator: &Simulator,
    prompter: &mut Prompter<R>,
    out: &mut W,
    rng: &mut G,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: Rng + ?Sized,
{
    loop {
        match prompter.ask(out)? {
            Some(answer) if is_affirmative(&answer) => {
                if let Err(err) = simulator.run_batch(out, rng).await {
                    tracing::debug!(error = ?err, "batch failed");
                    writeln!(out, "{CRASH_MESSAGE}")?;
                }
            }
            _ => {
                writeln!(out, "{FAREWELL}")?;
                return Ok(());
            }
        }
    }
}

fn configure(resolver: &str, mut config: Config) -> Result<()> {
    let id = ResolverId::try_from(resolver)?;

    if id.requires_api_key() {
        let key = Password::new(&format!("API key for {id}:")).without_confirmation().prompt()?;
        let key = key.trim();
        if key.is_empty() {
            bail!("API key for '{id}' must not be empty");
        }
        config.upsert_resolver_api_key(id, key.to_string());
    }

    if config.default_resolver_id().ok() != Some(id) {
        let make_default = Confirm::new(&format!("Use {id} as the default resolver?"))
            .with_default(true)
            .prompt()?;
        if make_default {
            config.set_default_resolver(id);
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}
