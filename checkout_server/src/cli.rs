use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets are deliberately left off this list
    const DISPLAY_ENVS: [&str; 19] = [
        "RUST_LOG",
        "CHK_HOST",
        "CHK_PORT",
        "CHK_DATABASE_URL",
        "CHK_USE_X_FORWARDED_FOR",
        "CHK_USE_FORWARDED",
        "CHK_SITE",
        "CHK_PARTNER_SHORT_CODE",
        "CHK_LMS_URL_ROOT",
        "CHK_LMS_TIMEOUT_SECS",
        "CHK_ECOMMERCE_URL_ROOT",
        "CHK_ENABLE_OTTO_RECEIPT_PAGE",
        "CHK_ENABLE_SDN_CHECK",
        "CHK_SDN_CHECK_API_URL",
        "CHK_SDN_CHECK_API_LIST",
        "CHK_PAYMENT_SUPPORT_EMAIL",
        "CHK_CYBERSOURCE_PROFILE_ID",
        "CHK_CYBERSOURCE_SOP_PAYMENT_PAGE_URL",
        "CHK_CYBERSOURCE_IP_WHITELIST",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<40} {val:<15}");
    })
}
