use crate::db::Database;
use crate::error::TrackerError;
use crate::model::{Game, GameInput};
use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::info;

pub fn create_game(database: &Database, input: GameInput, now: NaiveDateTime) -> Result<Game> {
    let input = normalize(input)?;

    if database.game_by_name(&input.name)?.is_some() {
        return Err(TrackerError::AlreadyExists { name: input.name }.into());
    }

    let game = database.insert_game(&input, now)?;
    info!(game_id = game.id, name = %game.name, "game added");

    Ok(game)
}

pub fn update_game(database: &Database, id: i64, input: GameInput) -> Result<Game> {
    let input = normalize(input)?;
    let existing = get_game(database, id)?;

    let taken = database
        .game_by_name(&input.name)?
        .is_some_and(|other| other.id != id);
    if taken {
        return Err(TrackerError::AlreadyExists { name: input.name }.into());
    }

    database.update_game(id, &input)?;

    Ok(Game {
        name: input.name,
        genre: input.genre,
        platform: input.platform,
        ..existing
    })
}

/// Removes the game with its sessions; schedules pointing at it are unlinked.
pub fn delete_game(database: &Database, id: i64) -> Result<()> {
    if !database.delete_game(id)? {
        return Err(not_found(id));
    }

    Ok(())
}

pub fn get_game(database: &Database, id: i64) -> Result<Game> {
    database.game(id)?.ok_or_else(|| not_found(id))
}

pub fn list_games(database: &Database) -> Result<Vec<Game>> {
    database.list_games()
}

pub fn games_by_genre(database: &Database, genre: &str) -> Result<Vec<Game>> {
    database.games_by_genre(genre.trim())
}

pub fn games_by_platform(database: &Database, platform: &str) -> Result<Vec<Game>> {
    database.games_by_platform(platform.trim())
}

pub fn genres(database: &Database) -> Result<Vec<String>> {
    database.genres()
}

pub fn platforms(database: &Database) -> Result<Vec<String>> {
    database.platforms()
}

pub fn most_played_games(database: &Database) -> Result<Vec<Game>> {
    database.most_played_games()
}

fn normalize(input: GameInput) -> Result<GameInput> {
    let name = input.name.trim().to_string();
    let genre = input.genre.trim().to_string();

    if name.is_empty() {
        return Err(blank("name"));
    }
    if genre.is_empty() {
        return Err(blank("genre"));
    }

    let platform = input
        .platform
        .map(|platform| platform.trim().to_string())
        .filter(|platform| !platform.is_empty());

    Ok(GameInput {
        name,
        genre,
        platform,
    })
}

fn blank(field: &'static str) -> anyhow::Error {
    TrackerError::InvalidInput {
        field,
        reason: "must not be blank".to_string(),
    }
    .into()
}

fn not_found(id: i64) -> anyhow::Error {
    TrackerError::NotFound { entity: "Game", id }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SystemSnapshot;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .expect("valid datetime")
    }

    fn input(name: &str, genre: &str, platform: Option<&str>) -> GameInput {
        GameInput {
            name: name.to_string(),
            genre: genre.to_string(),
            platform: platform.map(str::to_string),
        }
    }

    fn tracker_error(error: &anyhow::Error) -> &TrackerError {
        error.downcast_ref::<TrackerError>().expect("domain error")
    }

    #[test]
    fn create_trims_and_rejects_duplicates_ignoring_case() {
        let database = Database::open_in_memory().expect("db");

        let game = create_game(&database, input("  Hades ", "Roguelike", Some(" ")), now())
            .expect("create");
        assert_eq!(game.name, "Hades");
        assert_eq!(game.platform, None);

        let error = create_game(&database, input("HADES", "Roguelike", None), now())
            .expect_err("duplicate");
        assert!(matches!(
            tracker_error(&error),
            TrackerError::AlreadyExists { .. }
        ));

        let error = create_game(&database, input("Celeste", "  ", None), now())
            .expect_err("blank genre");
        assert!(matches!(
            tracker_error(&error),
            TrackerError::InvalidInput { field: "genre", .. }
        ));
    }

    #[test]
    fn update_allows_own_name_but_not_anothers() {
        let database = Database::open_in_memory().expect("db");
        let hades = create_game(&database, input("Hades", "Roguelike", None), now()).expect("hades");
        create_game(&database, input("Doom", "Shooter", Some("PC")), now()).expect("doom");

        let updated = update_game(&database, hades.id, input("hades", "Action", Some("Switch")))
            .expect("update");
        assert_eq!(updated.genre, "Action");
        assert_eq!(updated.created_at, hades.created_at);

        let error = update_game(&database, hades.id, input("DOOM", "Shooter", None))
            .expect_err("taken");
        assert!(matches!(
            tracker_error(&error),
            TrackerError::AlreadyExists { .. }
        ));

        let error = update_game(&database, 999, input("New", "Puzzle", None)).expect_err("missing");
        assert!(tracker_error(&error).is_not_found());
    }

    #[test]
    fn filters_and_distinct_lists() {
        let database = Database::open_in_memory().expect("db");
        create_game(&database, input("Doom", "Shooter", Some("PC")), now()).expect("doom");
        create_game(&database, input("Halo", "shooter", Some("Xbox")), now()).expect("halo");
        create_game(&database, input("Tetris", "Puzzle", None), now()).expect("tetris");

        assert_eq!(games_by_genre(&database, "SHOOTER").expect("genre").len(), 2);
        assert_eq!(games_by_platform(&database, "pc").expect("platform").len(), 1);
        assert_eq!(platforms(&database).expect("platforms"), vec!["PC", "Xbox"]);
        assert_eq!(list_games(&database).expect("list").len(), 3);
    }

    #[test]
    fn most_played_orders_by_session_count() {
        let database = Database::open_in_memory().expect("db");
        let doom = create_game(&database, input("Doom", "Shooter", None), now()).expect("doom");
        let halo = create_game(&database, input("Halo", "Shooter", None), now()).expect("halo");
        create_game(&database, input("Unplayed", "Puzzle", None), now()).expect("unplayed");

        let snapshot = SystemSnapshot::default();
        database.insert_session(doom.id, now(), &snapshot).expect("session");
        for _ in 0..2 {
            database.insert_session(halo.id, now(), &snapshot).expect("session");
        }

        let names = most_played_games(&database)
            .expect("most played")
            .into_iter()
            .map(|game| game.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Halo", "Doom"]);
    }

    #[test]
    fn delete_and_get_report_missing_games() {
        let database = Database::open_in_memory().expect("db");
        let game = create_game(&database, input("Doom", "Shooter", None), now()).expect("doom");

        delete_game(&database, game.id).expect("delete");
        assert!(tracker_error(&get_game(&database, game.id).expect_err("gone")).is_not_found());
        assert!(delete_game(&database, game.id).is_err());
    }
}
