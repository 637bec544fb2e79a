/// Realm Shell: several tabs of one realm in a single terminal.
///
/// Usage: realm_shell [--config <realm.ron>] [--world <world.ron>] [--seed <n>]
///
/// Lines starting with ':' drive the shell; anything else is typed into the
/// active tab.
///   :open <name> [avatar] [class] [color]   open a tab and create its character
///   :tab <n>                                switch to tab n
///   :tabs                                   list open tabs
///   :close                                  close the active tab
///   :quit                                   exit

use realm_engine::core::config::RealmConfig;
use realm_engine::schema::message::{Message, MessageKind};
use realm_engine::schema::player::{CharacterSheet, AVATAR_OPTIONS, CLASS_OPTIONS, COLOR_OPTIONS};
use realm_engine::{RealmEngine, Switchboard};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

struct Tab {
    label: String,
    engine: RealmEngine,
    /// Log position already printed.
    cursor: usize,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let mut config_path = None;
    let mut world_path = None;
    let mut seed = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--world" if i + 1 < args.len() => {
                i += 1;
                world_path = Some(PathBuf::from(&args[i]));
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse::<u64>().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "realm_engine=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = match config_path {
        Some(ref path) => match RealmConfig::load_from_ron(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => RealmConfig::default(),
    };
    if world_path.is_some() {
        config.world_path = world_path;
    }
    if seed.is_some() {
        config.seed = seed;
    }

    println!("Channel: {}", config.channel_name);
    println!("Type ':open <name>' to start a tab, ':help' for shell commands.\n");

    let mut switchboard = Switchboard::new();
    let mut tabs: Vec<Tab> = Vec::new();
    let mut active = 0usize;
    let mut opened = 0u64;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        match tabs.get(active) {
            Some(tab) => print!("{}> ", tab.label),
            None => print!("realm> "),
        }
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(meta) = line.strip_prefix(':') {
            let parts: Vec<&str> = meta.split_whitespace().collect();
            let cmd = parts.first().map(|c| c.to_lowercase()).unwrap_or_default();
            match cmd.as_str() {
                "quit" | "exit" | "q" => {
                    println!("Goodbye.");
                    break;
                }
                "help" | "h" | "?" => print_help(),
                "open" => {
                    if parts.len() < 2 {
                        println!("Usage: :open <name> [avatar] [class] [color]");
                        println!("  avatars: {}", AVATAR_OPTIONS.join(" "));
                        println!("  classes: {}", CLASS_OPTIONS.join(", "));
                        println!("  colors:  {}", COLOR_OPTIONS.join(", "));
                        continue;
                    }
                    let mut sheet = CharacterSheet::new(parts[1]);
                    if let Some(avatar) = parts.get(2) {
                        sheet = sheet.with_avatar(*avatar);
                    }
                    if let Some(class) = parts.get(3) {
                        sheet = sheet.with_class(*class);
                    }
                    if let Some(color) = parts.get(4) {
                        sheet = sheet.with_color(*color);
                    }

                    let mut builder = RealmEngine::builder().config(config.clone());
                    if let Some(base) = config.seed {
                        builder = builder.seed(base.wrapping_add(opened));
                    }
                    let port = switchboard.open(&config.channel_name);
                    let mut engine = match builder.build(port) {
                        Ok(e) => e,
                        Err(e) => {
                            println!("ERROR: {}", e);
                            continue;
                        }
                    };
                    pump_all(&mut tabs);
                    engine.pump();
                    if let Err(e) = engine.create_character(sheet) {
                        println!("ERROR: {}", e);
                        continue;
                    }
                    opened += 1;
                    tabs.push(Tab {
                        label: parts[1].to_string(),
                        engine,
                        cursor: 0,
                    });
                    active = tabs.len() - 1;
                    println!("Opened tab {}.", active);
                }
                "tab" => match parts.get(1).and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) if n < tabs.len() => {
                        active = n;
                        println!("Switched to tab {} ({}).", n, tabs[n].label);
                    }
                    _ => println!("Usage: :tab <n> (0..{})", tabs.len()),
                },
                "tabs" => {
                    if tabs.is_empty() {
                        println!("No tabs open.");
                    }
                    for (n, tab) in tabs.iter().enumerate() {
                        let marker = if n == active { "*" } else { " " };
                        let unread = tab.engine.messages().len() - tab.cursor;
                        println!("{} {} {} ({} unread)", marker, n, tab.label, unread);
                    }
                }
                "close" => {
                    if active < tabs.len() {
                        let tab = tabs.remove(active);
                        println!("Closed tab {} ({}).", active, tab.label);
                        drop(tab);
                        active = active.saturating_sub(1);
                    } else {
                        println!("No tab to close.");
                    }
                }
                other => println!("Unknown shell command: :{}", other),
            }
        } else {
            match tabs.get_mut(active) {
                Some(tab) => {
                    if let Err(e) = tab.engine.submit(line) {
                        println!("ERROR: {}", e);
                    }
                }
                None => {
                    println!("No tab open. Use ':open <name>' first.");
                    continue;
                }
            }
        }

        pump_all(&mut tabs);
        if let Some(tab) = tabs.get_mut(active) {
            print_new(tab);
        }
    }
}

/// Deliver pending frames until every tab is quiet. Replies to a
/// `sync-request` only land on the next pass.
fn pump_all(tabs: &mut [Tab]) {
    loop {
        let applied: usize = tabs.iter_mut().map(|t| t.engine.pump()).sum();
        if applied == 0 {
            break;
        }
    }
}

fn print_new(tab: &mut Tab) {
    for message in tab.engine.messages().since(tab.cursor) {
        print_message(message);
    }
    tab.cursor = tab.engine.messages().len();
}

fn print_message(message: &Message) {
    if let Some(ref art) = message.art {
        println!("{}", art);
    }
    match (message.kind, &message.sender) {
        (MessageKind::Chat, Some(sender)) => println!("[{}] {}", sender, message.content),
        (MessageKind::System, _) => println!("* {}", message.content),
        _ => println!("{}", message.content),
    }
}

fn print_usage() {
    println!("Usage: realm_shell [--config <realm.ron>] [--world <world.ron>] [--seed <n>]");
}

fn print_help() {
    println!("Shell commands:");
    println!("  :open <name> [avatar] [class] [color]   open a tab and create its character");
    println!("  :tab <n>                                switch to tab n");
    println!("  :tabs                                   list open tabs");
    println!("  :close                                  close the active tab");
    println!("  :quit                                   exit");
    println!();
    println!("Anything else is a game command for the active tab (try 'help').");
}
