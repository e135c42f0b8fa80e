//! Staff user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a user with a generated password
//! pharmship user create -e tech@pharmacy.com -n "Sam Tech" -r technician
//!
//! # Create a user with a known password
//! PHARMSHIP_USER_PASSWORD=... pharmship user create -e rx@pharmacy.com -n "Ana Rx" -r pharmacist
//!
//! # List users
//! pharmship user list
//! ```

use rand::distr::{Alphanumeric, SampleString};

use pharmship_core::UserRole;
use pharmship_dashboard::db::UserRepository;
use pharmship_dashboard::services::AuthService;

use super::{CommandError, connect};

/// Length of generated passwords.
const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Generate a random alphanumeric password.
pub(super) fn generate_password() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), GENERATED_PASSWORD_LENGTH)
}

/// Parse a role name, accepting any case.
fn parse_role(role: &str) -> Result<UserRole, CommandError> {
    role.parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))
}

/// Create a new staff user.
///
/// When `password` is `None` a random one is generated and printed once.
///
/// # Errors
///
/// Returns an error if the role is unknown, the email is taken or invalid,
/// or the database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: Option<String>,
) -> Result<(), CommandError> {
    let role = parse_role(role)?;
    let pool = connect().await?;

    let (password, generated) = match password {
        Some(password) => (password, false),
        None => (generate_password(), true),
    };

    tracing::info!("Creating user: {} ({})", email, role);
    let user = AuthService::new(&pool)
        .register_user(email, name, &password, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    if generated {
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password for {}: {password}", user.email);
            println!("It will not be shown again.");
        }
    }

    Ok(())
}

/// List every staff user.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool).list_all().await?;

    #[allow(clippy::print_stdout)]
    {
        for user in &users {
            println!(
                "{:>4}  {:<32} {:<12} {}",
                user.id.to_string(),
                user.email.as_str(),
                user.role.label(),
                user.name
            );
        }
        println!("{} user(s)", users.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_passwords_are_long_and_distinct() {
        let first = generate_password();
        let second = generate_password();
        assert_eq!(first.len(), GENERATED_PASSWORD_LENGTH);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_parse_role_accepts_legacy_case() {
        assert!(matches!(parse_role("PHARMACIST"), Ok(UserRole::Pharmacist)));
        assert!(matches!(
            parse_role("owner"),
            Err(CommandError::InvalidRole(r)) if r == "owner"
        ));
    }
}
