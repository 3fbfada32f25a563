use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const PASSWORD_ENV: &str = "CREDHASH_PASSWORD";

/// Password from the environment or piped stdin, if either provides one.
fn non_interactive_password() -> Result<Option<Zeroizing<String>>> {
    //  CREDHASH_PASSWORD="supersecret" credhash verify --file admin.cred
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Some(Zeroizing::new(pw)));
        }
    }

    //  echo "supersecret" | credhash hash
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(Some(buf));
        }
    }

    Ok(None)
}

/// Reads the password to check against an existing credential.
pub fn read_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = non_interactive_password()? {
        return Ok(pw);
    }

    if io::stdin().is_terminal() {
        let pw = Zeroizing::new(rpassword::prompt_password("Password: ")?);
        if !pw.is_empty() {
            return Ok(pw);
        }
    }

    bail!("No password provided")
}

/// Reads a password for a new credential, asking twice on a terminal.
pub fn read_new_password_with_confirmation() -> Result<Zeroizing<String>> {
    if let Some(pw) = non_interactive_password()? {
        return Ok(pw);
    }

    if !io::stdin().is_terminal() {
        bail!("No password provided");
    }

    let pw1 = Zeroizing::new(rpassword::prompt_password("New password: ")?);
    let pw2 = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);

    if pw1.is_empty() {
        bail!("password cannot be empty");
    }

    if pw1 != pw2 {
        bail!("passwords do not match");
    }

    Ok(pw1)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
