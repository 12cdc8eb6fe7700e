use clap::Subcommand;
use mealy_core::storage::credentials::{clear_token, resolve_token, store_token, TokenSource};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the API token in the OS keyring
    SetToken {
        /// Bearer token issued by the status store
        token: String,
    },
    /// Remove the stored API token
    Clear,
    /// Show where the active token comes from
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::SetToken { token } => {
            store_token(&token)?;
            println!("token stored");
        }
        AuthAction::Clear => {
            clear_token()?;
            println!("token cleared");
        }
        AuthAction::Status => {
            let status = match resolve_token() {
                Some((_, TokenSource::Env)) => "authenticated (MEALY_TOKEN)",
                Some((_, TokenSource::Keyring)) => "authenticated (keyring)",
                None => "not authenticated",
            };
            println!("{status}");
        }
    }
    Ok(())
}
