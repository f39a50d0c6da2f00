//! Session commands: login, register, logout, whoami, role.

use bazaar_client::SessionState;
use bazaar_core::{Email, Role};

use super::App;

/// Log in and persist the credential for later invocations.
pub async fn login(
    app: &App,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = app.session.login(username, password).await?;
    println!("Logged in as {} ({})", identity.username, identity.role);
    Ok(())
}

/// Create an account. Login stays a separate, explicit step.
pub async fn register(
    app: &App,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    app.session.register(username, &email, password).await?;
    println!("Account created. Run `bazaar login` to sign in.");
    Ok(())
}

/// Clear the stored session. Local-only, cannot fail.
pub fn logout(app: &App) {
    app.session.logout();
    println!("Logged out");
}

/// Show the current session identity.
pub fn whoami(app: &App) {
    match app.session.state() {
        SessionState::Authenticated(session) => {
            let identity = &session.identity;
            println!("{} <{}> role={}", identity.username, identity.email, identity.role);
        }
        SessionState::Unauthenticated => println!("Not logged in"),
        SessionState::Resolving => println!("Session still resolving"),
    }
}

/// Change the account role.
pub async fn update_role(app: &App, role: Role) -> Result<(), Box<dyn std::error::Error>> {
    let identity = app.session.update_role(role).await?;
    println!("Role updated: {} is now a {}", identity.username, identity.role);
    Ok(())
}
