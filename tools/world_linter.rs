/// World Linter: validates a world file and reports graph problems.
///
/// Usage: world_linter <world.ron> [--phrases <phrases.ron>]
///
/// Hard errors (exit 1): the file fails to load (bad RON, unknown or repeated
/// directions, dangling exits or an unknown start room).
/// Warnings: rooms unreachable from the start room, dead ends, one-way exits.

use realm_engine::core::narration::PhraseBook;
use realm_engine::core::world::WorldTemplate;
use realm_engine::schema::room::RoomId;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: world_linter <world.ron> [--phrases <phrases.ron>]");
        process::exit(0);
    }

    let world_path = &args[1];
    let mut phrases_path = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--phrases" && i + 1 < args.len() {
            i += 1;
            phrases_path = Some(args[i].clone());
        }
        i += 1;
    }

    let template = match WorldTemplate::load_from_ron(Path::new(world_path)) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("ERROR: Failed to load world file: {}", e);
            process::exit(1);
        }
    };
    println!("Loaded {} rooms", template.rooms().len());

    let mut errors = Vec::new();
    if let Some(ref path) = phrases_path {
        match PhraseBook::load_from_ron(Path::new(path)) {
            Ok(_) => println!("Loaded phrase book {}", path),
            Err(e) => errors.push(format!("phrase book {}: {}", path, e)),
        }
    }

    let warnings = lint_world(&template);

    println!("\n=== World Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_world(template: &WorldTemplate) -> Vec<String> {
    let mut warnings = Vec::new();
    let rooms = template.rooms();

    // Reachability from the start room
    let mut reached: HashSet<&RoomId> = HashSet::new();
    let mut queue: VecDeque<&RoomId> = VecDeque::new();
    reached.insert(template.start_room());
    queue.push_back(template.start_room());
    while let Some(id) = queue.pop_front() {
        if let Some(room) = rooms.iter().find(|r| &r.id == id) {
            for target in room.exits.values() {
                if reached.insert(target) {
                    queue.push_back(target);
                }
            }
        }
    }

    for room in rooms {
        if !reached.contains(&room.id) {
            warnings.push(format!(
                "Room '{}' is unreachable from start room '{}'",
                room.id,
                template.start_room()
            ));
        }

        if room.exits.is_empty() {
            warnings.push(format!("Room '{}' has no exits", room.id));
        }

        for (direction, target) in &room.exits {
            let returns = rooms
                .iter()
                .find(|r| &r.id == target)
                .map(|r| r.exits.values().any(|back| back == &room.id))
                .unwrap_or(false);
            if !returns {
                warnings.push(format!(
                    "Exit {} from '{}' to '{}' is one-way",
                    direction, room.id, target
                ));
            }
        }
    }

    warnings
}
