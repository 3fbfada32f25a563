use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
mod auth;
use credhash::{DEFAULT_MAX_MEMORY, Hasher, HasherConfig, KdfParams, Storage, format};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Args)]
struct ScryptArgs {
    /// log2 of the scrypt cost factor N (default: 17)
    #[arg(long, env = "CREDHASH_LN")]
    ln: Option<u32>,

    /// scrypt block size (default: 8)
    #[arg(long, env = "CREDHASH_R")]
    r: Option<u32>,

    /// scrypt parallelization (default: 1)
    #[arg(long, env = "CREDHASH_P")]
    p: Option<u32>,
}

impl ScryptArgs {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        let default = KdfParams::default();

        Ok(KdfParams::new(
            self.ln.unwrap_or(default.ln()),
            self.r.unwrap_or(default.r()),
            self.p.unwrap_or(default.p()),
        )?)
    }
}

#[derive(Debug, clap::Args)]
struct LimitArgs {
    /// Memory ceiling for one derivation, in bytes
    #[arg(long, env = "CREDHASH_MAX_MEMORY", default_value_t = DEFAULT_MAX_MEMORY)]
    max_memory: u64,
}

#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
struct CredentialSource {
    /// Credential string, e.g. '$scrypt$ln=17,r=8,p=1$...$...'
    credential: Option<String>,

    /// Read the credential string from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

impl CredentialSource {
    fn resolve(self) -> Result<String> {
        match (self.credential, self.file) {
            (Some(credential), _) => Ok(credential),
            (None, Some(path)) => Storage::new(path).load(),
            (None, None) => bail!("no credential given"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "credhash")]
#[command(
    version,
    about = "Create, verify and inspect scrypt credential strings."
)]
struct Cli {
    /// Log derivation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Hashes a password into a new credential string
    Hash {
        #[command(flatten)]
        scrypt: ScryptArgs,

        #[command(flatten)]
        limit: LimitArgs,

        /// Salt length in bytes (default: 16)
        #[arg(long, env = "CREDHASH_SALT_LEN")]
        salt_len: Option<usize>,

        /// Write the credential string to a file instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Overwrite an existing credential file
        #[arg(long, requires = "out", default_value_t = false)]
        force: bool,
    },

    /// Checks a password against a credential string
    Verify {
        #[command(flatten)]
        source: CredentialSource,

        // Compared against the stored parameters for the rehash note.
        #[command(flatten)]
        scrypt: ScryptArgs,

        #[command(flatten)]
        limit: LimitArgs,
    },

    /// Shows the parameters embedded in a credential string
    Inspect {
        #[command(flatten)]
        source: CredentialSource,

        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Hash {
            scrypt,
            limit,
            salt_len,
            out,
            force,
        } => {
            let storage = out.map(Storage::new);
            if let Some(storage) = &storage {
                if storage.exists() && !force {
                    bail!(
                        "credential file already exists at {} (use --force to overwrite)",
                        storage.path().display()
                    );
                }
            }

            let mut config =
                HasherConfig::new(scrypt.to_kdf_params()?).with_max_memory(limit.max_memory);
            if let Some(salt_len) = salt_len {
                config = config.with_salt_len(salt_len);
            }

            let password = auth::read_new_password_with_confirmation()?;
            let credential = Hasher::new(config)
                .hash_password(&password)
                .context("failed to hash password")?;
            drop(password);

            match storage {
                Some(storage) => {
                    storage.save(&credential)?;
                    println!("credential written to {}", storage.path().display());
                }
                None => println!("{credential}"),
            }
        }
        Commands::Verify {
            source,
            scrypt,
            limit,
        } => {
            let config =
                HasherConfig::new(scrypt.to_kdf_params()?).with_max_memory(limit.max_memory);
            let stored = source.resolve()?;
            let password = auth::read_password()?;
            let hasher = Hasher::new(config);

            if !hasher.verify_password(&password, &stored) {
                bail!("password does not match");
            }
            println!("password matches");

            if hasher.needs_rehash(&stored) {
                let kdf = hasher.config().kdf();
                eprintln!(
                    "note: credential parameters differ from the configured ln={},r={},p={}; consider rehashing",
                    kdf.ln(),
                    kdf.r(),
                    kdf.p()
                );
            }
        }
        Commands::Inspect { source, json } => {
            let stored = source.resolve()?;
            let params = format::decode(&stored).context("malformed credential string")?;
            let kdf = params.kdf();

            if json {
                let info = serde_json::json!({
                    "algorithm": format::IDENTIFIER,
                    "kdf": kdf,
                    "n": kdf.n(),
                    "salt_len": params.salt().len(),
                    "hash_len": params.hash().len(),
                    "max_memory": kdf.max_memory(),
                    "required_memory": kdf.required_memory(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                let n = kdf.n().map_or_else(|| "overflow".to_string(), |n| n.to_string());
                let bytes = |m: Option<u64>| {
                    m.map_or_else(|| "overflow".to_string(), |m| format!("{m} bytes"))
                };
                let memory = bytes(kdf.max_memory());
                let required = bytes(kdf.required_memory());

                println!("algorithm: {}", format::IDENTIFIER);
                println!("ln:        {} (N = {n})", kdf.ln());
                println!("r:         {}", kdf.r());
                println!("p:         {}", kdf.p());
                println!("salt:      {} bytes", params.salt().len());
                println!("hash:      {} bytes", params.hash().len());
                println!("memory:    {memory}");
                println!("required:  {required}");
            }
        }
    }

    Ok(())
}
