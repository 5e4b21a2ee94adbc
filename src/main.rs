use log::{error, info, warn};
use std::env;
use std::process::ExitCode;
use trusty_ballot::db::cache;
use trusty_ballot::voting::summary;
use trusty_ballot::{Config, Database, EntityKey, Result, Scope, Summary, VotableKey};

const USAGE: &str =
    "usage: trusty-ballot <summary|refresh> <votable_type> <votable_id> [scope] [--cached]";

enum Command {
    Summary {
        votable: EntityKey,
        scope: Scope,
        cached: bool,
    },
    Refresh {
        votable: EntityKey,
        scope: Scope,
    },
}

fn parse_args(args: &[String]) -> Option<Command> {
    let cached = args.iter().any(|arg| arg == "--cached");
    let positional: Vec<&str> = args
        .iter()
        .filter(|arg| !arg.starts_with("--"))
        .map(String::as_str)
        .collect();

    let (name, kind, id) = match positional.as_slice() {
        [name, kind, id, ..] => (*name, *kind, *id),
        _ => return None,
    };
    let votable = EntityKey::new(kind, id);
    let scope = Scope::from(positional.get(3).copied());

    match name {
        "summary" => Some(Command::Summary {
            votable,
            scope,
            cached,
        }),
        "refresh" => Some(Command::Refresh { votable, scope }),
        _ => None,
    }
}

async fn execute(database: &Database, command: Command) -> Result<Summary> {
    match command {
        Command::Summary {
            votable,
            scope,
            cached,
        } => {
            // The binary cannot know the votable's declaration, so the cache is
            // only read when asked for
            let key = VotableKey {
                entity: votable,
                cached,
            };
            let mut conn = database.pool().acquire().await?;
            summary::read(&mut conn, &key, &scope, false).await
        }
        Command::Refresh { votable, scope } => {
            let mut tx = database.pool().begin().await?;
            if !cache::cache_exists(&mut tx, &votable).await? {
                warn!("{} keeps no summary cache; reporting live numbers", votable);
                return summary::compute(&mut tx, &votable, &scope).await;
            }

            let summary = summary::recompute(&mut tx, &votable, &scope).await?;
            tx.commit().await?;
            info!("Stored {} summary for {}", scope, votable);
            Ok(summary)
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let config = Config::from_env()?;
    let database = Database::new(&config).await?;

    let summary = execute(&database, command).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Ballot command failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trusty_ballot::Vote;
    use trusty_ballot::db::Ledger;
    use trusty_ballot::models::SlotKey;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    async fn database_with_vote(votable: &EntityKey) -> Database {
        let database = Database::in_memory().await.unwrap();
        let slot = SlotKey {
            voter: EntityKey::new("User", "1"),
            votable: votable.clone(),
            scope: Scope::default_scope(),
        };
        let mut conn = database.pool().acquire().await.unwrap();
        Ledger::new(&mut conn)
            .insert(&Vote::new(&slot, true, 3))
            .await
            .unwrap();
        database
    }

    #[test]
    fn parses_summary_with_scope_and_cached_flag() {
        match parse_args(&args(&["summary", "Post", "1", "love", "--cached"])) {
            Some(Command::Summary {
                votable,
                scope,
                cached,
            }) => {
                assert_eq!(votable, EntityKey::new("Post", "1"));
                assert_eq!(scope, Scope::from("love"));
                assert!(cached);
            }
            _ => panic!("expected summary command"),
        }
        match parse_args(&args(&["summary", "Comment", "1"])) {
            Some(Command::Summary { cached, .. }) => assert!(!cached),
            _ => panic!("expected summary command"),
        }
    }

    #[test]
    fn refresh_defaults_to_default_scope() {
        match parse_args(&args(&["refresh", "Post", "1"])) {
            Some(Command::Refresh { scope, .. }) => assert!(scope.is_default()),
            _ => panic!("expected refresh command"),
        }
        assert!(parse_args(&args(&["tally", "Post", "1"])).is_none());
        assert!(parse_args(&args(&["summary", "Post"])).is_none());
    }

    #[tokio::test]
    async fn summary_reads_live_numbers_unless_cached_is_requested() {
        let comment = EntityKey::new("Comment", "1");
        let database = database_with_vote(&comment).await;

        let live = execute(
            &database,
            Command::Summary {
                votable: comment.clone(),
                scope: Scope::default_scope(),
                cached: false,
            },
        )
        .await
        .unwrap();
        assert_eq!((live.total, live.weighted_score), (1, 3));

        // No blob was ever written, so the cached read is empty
        let cached = execute(
            &database,
            Command::Summary {
                votable: comment,
                scope: Scope::default_scope(),
                cached: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(cached, Summary::default());
    }

    #[tokio::test]
    async fn refresh_leaves_uncached_kinds_without_a_blob() {
        let comment = EntityKey::new("Comment", "1");
        let database = database_with_vote(&comment).await;

        let reported = execute(
            &database,
            Command::Refresh {
                votable: comment.clone(),
                scope: Scope::default_scope(),
            },
        )
        .await
        .unwrap();
        assert_eq!(reported.total, 1);

        let mut conn = database.pool().acquire().await.unwrap();
        assert!(!cache::cache_exists(&mut conn, &comment).await.unwrap());
    }

    #[tokio::test]
    async fn refresh_rebuilds_an_existing_blob() {
        let post = EntityKey::new("Post", "1");
        let database = database_with_vote(&post).await;
        {
            let mut conn = database.pool().acquire().await.unwrap();
            cache::init_cache(&mut conn, &post).await.unwrap();
        }

        execute(
            &database,
            Command::Refresh {
                votable: post.clone(),
                scope: Scope::default_scope(),
            },
        )
        .await
        .unwrap();

        let mut conn = database.pool().acquire().await.unwrap();
        let stored = cache::load_cache(&mut conn, &post).await.unwrap();
        assert_eq!(stored.get("").map(|s| s.weighted_total), Some(3));
    }
}
