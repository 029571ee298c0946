use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jwecrypt", version, about = "Encrypt messages to many X25519 recipients as JWE")]
pub struct Cli {
    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a local X25519 keypair
    Init(InitArgs),
    /// Show identity (public key, fingerprint)
    Whoami,
    /// Manage known recipients
    #[command(subcommand)]
    Keyring(KeyringCommand),
    /// Encrypt a message for one or more recipients
    Encrypt(EncryptArgs),
    /// Decrypt a message addressed to this identity
    Decrypt(DecryptArgs),
    /// Show the headers and recipient entries of a message without decrypting
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct InitArgs {
    /// Skip overwrite confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Store the secret key without a passphrase
    #[arg(long)]
    pub no_passphrase: bool,
}

#[derive(Subcommand)]
pub enum KeyringCommand {
    /// Add a recipient's X25519 public key
    Add(KeyringAddArgs),
    /// List known recipients
    List,
    /// Forget every key of a recipient
    Remove(KeyringRemoveArgs),
}

#[derive(Parser)]
pub struct KeyringAddArgs {
    /// Recipient identifier, e.g. did:example:bob
    #[arg(value_name = "ID")]
    pub id: String,

    /// base64url-encoded X25519 public key
    #[arg(value_name = "PUBKEY")]
    pub public_key: String,

    /// Key identifier written as kid (defaults to ID)
    #[arg(long, value_name = "KID")]
    pub kid: Option<String>,
}

#[derive(Parser)]
pub struct KeyringRemoveArgs {
    /// Recipient identifier
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Parser)]
pub struct EncryptArgs {
    /// Recipient identifier from the keyring (repeatable)
    #[arg(long = "to", value_name = "ID", required = true)]
    pub to: Vec<String>,

    /// Authenticate as the sender with ECDH-1PU
    #[arg(long)]
    pub auth: bool,

    /// Sender key identifier for authenticated messages
    #[arg(long, value_name = "SKID", requires = "auth")]
    pub skid: Option<String>,

    /// Additional authenticated data, bound to the message but not encrypted
    #[arg(long, value_name = "TEXT")]
    pub aad: Option<String>,

    /// Extra protected header field as KEY=VALUE (repeatable)
    #[arg(long = "header", value_name = "KEY=VALUE")]
    pub headers: Vec<String>,

    /// Emit indented JSON
    #[arg(long)]
    pub pretty: bool,

    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,
}

#[derive(Parser)]
pub struct DecryptArgs {
    /// Expect an authenticated message from this keyring identifier
    #[arg(long, value_name = "ID")]
    pub from: Option<String>,

    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,
}
