use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("pagechat")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Pagechat Contributors")
        .about("Scrape a web page, then ask questions about it")
        .arg(clap::arg!(--url <URL> "Page to scrape before the first message").conflicts_with("html"))
        .arg(
            clap::arg!(--html <FILE> "Local HTML file to load instead of fetching")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--"base-url" <URL> "URL the local HTML file is treated as coming from")
                .value_name("URL")
                .requires("html"),
        )
        .arg(clap::arg!(-q --question <QUESTION> "Ask a single question and exit instead of reading stdin"))
        .arg(clap::arg!(--json "Print each reply as a JSON line"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("15"))
        .arg(clap::arg!(--"max-redirects" <NUM> "Maximum number of redirects to follow").default_value("5"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(
            clap::arg!(--"max-answer-chars" <NUM> "Maximum answer length in characters (at least 20)")
                .default_value("600")
                .value_parser(clap::builder::RangedU64ValueParser::<usize>::new().range(20..)),
        )
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_name("SHELL")
                .value_parser(["bash", "elvish", "fish", "powershell", "zsh"]),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "pagechat", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "pagechat", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "pagechat", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "pagechat", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
