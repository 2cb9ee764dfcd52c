//! `intern`: command-line access to the Boss.
//!
//! Reads `~/.intern/intern.cfg` (or `--config`), applies the `BOSSHOST`,
//! `BOSSPROTOCOL` and `BOSSTOKEN` overrides, and runs one operation.

use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use intern::config::{ConfigSource, RemoteConfig, PROJECT_SECTION};
use intern::http::{ReqwestBackend, SendOptions};
use intern::service::DEFAULT_API_VERSION;
use intern::{auth, BossRemote, ChannelResource, Datatype, ExperimentResource, Remote, Resource};

#[derive(Parser)]
#[command(name = "intern", version, about = "Boss data API client", long_about = None)]
struct Cli {
    /// Config file; defaults to ~/.intern/intern.cfg.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = DEFAULT_API_VERSION)]
    api_version: String,

    /// Skip TLS certificate verification.
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List collections, or the experiments of a collection, or the
    /// channels of an experiment.
    List {
        #[arg(long)]
        collection: Option<String>,
        #[arg(long, requires = "collection")]
        experiment: Option<String>,
    },
    #[command(subcommand)]
    Group(GroupCommand),
    #[command(subcommand)]
    User(UserCommand),
    /// Download a cutout and write its raw little-endian voxels to a file.
    Cutout {
        collection: String,
        experiment: String,
        channel: String,
        #[arg(long, default_value_t = 0)]
        res: u32,
        #[arg(long, value_parser = parse_range, value_name = "START:STOP")]
        x: Range<u64>,
        #[arg(long, value_parser = parse_range, value_name = "START:STOP")]
        y: Range<u64>,
        #[arg(long, value_parser = parse_range, value_name = "START:STOP")]
        z: Range<u64>,
        #[arg(long, value_parser = parse_range, value_name = "START:STOP")]
        t: Option<Range<u64>>,
        #[arg(long, default_value = "uint8")]
        datatype: Datatype,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Fetch a bearer token from the auth server.
    Token {
        #[arg(long)]
        user: String,
        #[arg(long, env = "BOSS_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum GroupCommand {
    /// Check that a group exists, or that a user belongs to it.
    Get {
        name: String,
        #[arg(long)]
        user: Option<String>,
    },
    Create {
        name: String,
    },
    /// Delete a group, or remove a user from it.
    Delete {
        name: String,
        #[arg(long)]
        user: Option<String>,
    },
    AddUser {
        name: String,
        user: String,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    Get { user: String },
    Groups { user: String },
    Roles { user: String },
}

/// Parse `start:stop` into a half-open range.
fn parse_range(s: &str) -> Result<Range<u64>, String> {
    let (start, stop) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:STOP, got {}", s))?;
    let start = start.trim().parse::<u64>().map_err(|e| format!("bad start {}: {}", start, e))?;
    let stop = stop.trim().parse::<u64>().map_err(|e| format!("bad stop {}: {}", stop, e))?;
    Ok(start..stop)
}

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<RemoteConfig> {
    let source = match path {
        Some(p) => ConfigSource::File(p.clone()),
        None => ConfigSource::DefaultFile,
    };
    Ok(RemoteConfig::load(&source)?.with_env_overrides())
}

fn send_options(insecure: bool) -> SendOptions {
    SendOptions {
        verify: !insecure,
        ..SendOptions::default()
    }
}

fn group_miss(name: &str, user: Option<&str>) -> anyhow::Error {
    match user {
        Some(user) => anyhow!("{} is not a member of group {}", user, name),
        None => anyhow!("group {} not found", name),
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "intern=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let remote = BossRemote::with_send_options(config, &cli.api_version, send_options(cli.insecure))?;

    match cli.command {
        Command::List { collection, experiment } => {
            let resource: Option<Resource> = match (collection, experiment) {
                (None, _) => None,
                (Some(coll), None) => Some(ExperimentResource::new("", &coll, "").into()),
                (Some(coll), Some(exp)) => Some(ChannelResource::image("", &coll, &exp, Datatype::Uint8).into()),
            };
            print_lines(&remote.list_project(resource.as_ref())?);
        }
        Command::Group(cmd) => match cmd {
            GroupCommand::Get { name, user } => {
                let found = remote.get_group(&name, user.as_deref())?;
                println!("{}", found);
                if !found {
                    return Err(group_miss(&name, user.as_deref()));
                }
            }
            GroupCommand::Create { name } => {
                remote.create_group(&name)?;
                tracing::info!("created group {}", name);
            }
            GroupCommand::Delete { name, user } => {
                remote.delete_group(&name, user.as_deref())?;
                match user {
                    Some(user) => tracing::info!("removed {} from group {}", user, name),
                    None => tracing::info!("deleted group {}", name),
                }
            }
            GroupCommand::AddUser { name, user } => {
                remote.add_user_to_group(&name, &user)?;
                tracing::info!("added {} to {}", user, name);
            }
        },
        Command::User(cmd) => match cmd {
            UserCommand::Get { user } => {
                let details = remote.get_user(&user)?;
                println!("{}", serde_json::to_string_pretty(&details)?);
            }
            UserCommand::Groups { user } => print_lines(&remote.get_user_groups(&user)?),
            UserCommand::Roles { user } => print_lines(&remote.get_user_roles(&user)?),
        },
        Command::Cutout {
            collection,
            experiment,
            channel,
            res,
            x,
            y,
            z,
            t,
            datatype,
            out,
        } => {
            let resource: Resource = ChannelResource::image(&channel, &collection, &experiment, datatype).into();
            let bytes: Vec<u8> = match datatype {
                Datatype::Uint8 => remote
                    .get_cutout::<u8>(&resource, res, x, y, z, t)?
                    .iter()
                    .copied()
                    .collect(),
                Datatype::Uint16 => remote
                    .get_cutout::<u16>(&resource, res, x, y, z, t)?
                    .iter()
                    .flat_map(|v| v.to_le_bytes())
                    .collect(),
                Datatype::Uint64 => remote
                    .get_cutout::<u64>(&resource, res, x, y, z, t)?
                    .iter()
                    .flat_map(|v| v.to_le_bytes())
                    .collect(),
            };
            fs::write(&out, &bytes).with_context(|| format!("writing {}", out.display()))?;
            tracing::info!(bytes = bytes.len(), "wrote cutout to {}", out.display());
        }
        Command::Token { user, password } => {
            let endpoint = remote.config().endpoint(PROJECT_SECTION)?;
            let backend = ReqwestBackend::new(send_options(cli.insecure))?;
            let token = auth::get_access_token(&endpoint, &user, &password, &backend)
                .with_context(|| format!("could not log in as {}", user))?;
            println!("{}", token);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ranges() {
        assert_eq!(parse_range("10:20").unwrap(), 10..20);
        assert!(parse_range("10").is_err());
        assert!(parse_range("a:2").is_err());
    }

    #[test]
    fn group_miss_names_the_case() {
        assert_eq!(group_miss("lab", None).to_string(), "group lab not found");
        assert_eq!(
            group_miss("lab", Some("alice")).to_string(),
            "alice is not a member of group lab"
        );
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_cutout_command() {
        let cli = Cli::try_parse_from([
            "intern", "cutout", "coll", "exp", "chan", "--x", "0:2", "--y", "0:2", "--z", "0:1", "--out", "c.raw",
        ])
        .unwrap();
        match cli.command {
            Command::Cutout { x, t, datatype, .. } => {
                assert_eq!(x, 0..2);
                assert!(t.is_none());
                assert_eq!(datatype, Datatype::Uint8);
            }
            _ => panic!("expected cutout"),
        }
    }
}
