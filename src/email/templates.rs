use anyhow::Context;
use tera::Tera;

pub const VERIFY_EMAIL: &str = "emails/verify.txt";
pub const RESET_PASSWORD_TOKEN: &str = "emails/reset_password_token.txt";
pub const RESET_PASSWORD_NO_ACCOUNT: &str = "emails/reset_password_no_account.txt";

/// Build the template engine used to render email bodies.
///
/// Templates are compiled into the binary so the server does not depend on
/// its working directory.
pub fn load_templates() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (
            VERIFY_EMAIL,
            include_str!("../../templates/emails/verify.txt"),
        ),
        (
            RESET_PASSWORD_TOKEN,
            include_str!("../../templates/emails/reset_password_token.txt"),
        ),
        (
            RESET_PASSWORD_NO_ACCOUNT,
            include_str!("../../templates/emails/reset_password_no_account.txt"),
        ),
    ])
    .context("Failed to parse email templates.")?;

    Ok(tera)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_reset_link() {
        let tera = load_templates().unwrap();
        let mut context = tera::Context::new();
        context.insert("frontend_url", "https://app.example.com");
        context.insert("token", "abc123");

        let body = tera.render(RESET_PASSWORD_TOKEN, &context).unwrap();

        assert!(body.contains("https://app.example.com/reset-password?token=abc123"));
    }
}
