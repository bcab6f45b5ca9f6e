// Command line interface
// `serve` runs the proxy; everything else is a client of that proxy plus
// the local data store.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::Config;
use crate::library::auth::{require_session, Auth};
use crate::library::favorites::AddOutcome;
use crate::library::models::Video;
use crate::library::store::Store;
use crate::player::playback::format_time;
use crate::player::queue::{Playable, Queue};
use crate::server;
use crate::ui::session::PlayerSession;
use crate::youtube::debounce::{Debouncer, Generation};
use crate::youtube::proxy_client::{ProxyClient, ProxyError, SuggestionsBody};

const AUDIO_EXTENSIONS: [&str; 8] = ["mp3", "wav", "ogg", "flac", "m4a", "aac", "opus", "webm"];

const NO_FAVORITES: &str =
    "No favorites yet. Add some with `soundwave search <query> --favorite <n>`.";
const NO_SONGS: &str = "Your library is empty. Add songs with `soundwave library add`.";

// How long the suggest prompt waits for a last answer after stdin closes
const SUGGEST_DRAIN: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding favorites, songs, accounts and the session
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the SoundWave server used by the client commands
    #[arg(long, global = true, value_name = "URL")]
    pub server_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the YouTube proxy server
    Serve {
        #[arg(long)]
        host: Option<IpAddr>,
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a local account and log in
    Register {
        name: String,
        email: String,
        password: String,
    },

    Login {
        email: String,
        password: String,
    },

    Logout,

    /// Show who is logged in
    Whoami,

    /// Search YouTube music videos
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[arg(short = 'n', long, default_value_t = 12)]
        max: u32,

        /// Add result N (1-based) to favorites
        #[arg(long, value_name = "N")]
        favorite: Option<usize>,
    },

    /// Autocomplete a query; without one, reads queries from stdin as you type them
    Suggest { query: Option<String> },

    /// List or remove favorites
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Manage local audio files
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Show or clear recent searches
    Recent {
        #[arg(long)]
        clear: bool,
    },

    /// Play favorites (or the library) with keyboard commands
    Play {
        /// Play the local library instead of favorites
        #[arg(long)]
        library: bool,
        #[arg(long)]
        shuffle: bool,
        #[arg(long)]
        repeat: bool,
        /// Open each track with the system handler as it starts
        #[arg(long)]
        open: bool,
        /// Id of the item to start with
        #[arg(long, value_name = "ID")]
        start: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FavoritesAction {
    List,
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum LibraryAction {
    Add {
        file: PathBuf,
        /// Defaults to the file name without its extension
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: String,
        /// Length in seconds, if known
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },
    List,
    Remove { id: String },
}

impl Args {
    /// Folds the global flags into the environment configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
    }
}

pub async fn run(args: Args, mut config: Config) -> Result<()> {
    args.apply_to(&mut config);

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            server::serve(&config).await
        }
        command => client(command, &config).await,
    }
}

async fn client(command: Command, config: &Config) -> Result<()> {
    let mut store = Store::load(&config.data_dir)
        .with_context(|| format!("loading data from {}", config.data_dir.display()))?;
    let proxy = ProxyClient::new(&config.server_url);

    match command {
        Command::Serve { .. } => bail!("`serve` does not use the client store"),

        Command::Register { name, email, password } => {
            let session = Auth::new(&mut store).register(&name, &email, &password)?;
            save(&store)?;
            println!("Welcome, {}! You are logged in.", session.name);
        }

        Command::Login { email, password } => {
            let session = Auth::new(&mut store).login(&email, &password)?;
            save(&store)?;
            println!("Logged in as {}.", session.name);
        }

        Command::Logout => {
            require_session(&store)?;
            if let Some(session) = Auth::new(&mut store).logout() {
                save(&store)?;
                println!("Goodbye, {}.", session.name);
            }
        }

        Command::Whoami => {
            let session = Auth::new(&mut store).current().cloned();
            match session {
                Some(session) => println!("{} <{}>", session.name, session.email),
                None => println!("Not logged in."),
            }
        }

        Command::Search { query, max, favorite } => {
            require_session(&store)?;
            search(&mut store, &proxy, &query.join(" "), max, favorite).await?;
        }

        Command::Suggest { query: Some(query) } => {
            let body = proxy.suggestions(&query).await.context("fetching suggestions")?;
            print_suggestions(&body);
        }

        Command::Suggest { query: None } => suggest_prompt(proxy).await?,

        Command::Favorites { action } => {
            require_session(&store)?;
            match action.unwrap_or(FavoritesAction::List) {
                FavoritesAction::List => print_favorites(store.favorites.videos()),
                FavoritesAction::Remove { id } => {
                    let title = store
                        .favorites
                        .get(&id)
                        .map(|video| video.title.clone())
                        .with_context(|| format!("no favorite with id {id}"))?;
                    store.favorites.remove(&id);
                    save(&store)?;
                    println!("Removed '{title}' from favorites.");
                }
            }
        }

        Command::Library { action } => {
            require_session(&store)?;
            library(&mut store, action)?;
        }

        Command::Recent { clear } => {
            require_session(&store)?;
            if clear {
                store.recent.clear();
                save(&store)?;
                println!("Recent searches cleared.");
            } else if store.recent.entries().is_empty() {
                println!("No recent searches.");
            } else {
                for entry in store.recent.entries() {
                    println!("  {entry}");
                }
            }
        }

        Command::Play { library, shuffle, repeat, open, start } => {
            require_session(&store)?;
            let options = PlayOptions { shuffle, repeat, open, start };
            if library {
                let songs = store.library.songs().to_vec();
                play(songs, options, NO_SONGS).await?;
            } else {
                let videos = store.favorites.videos().to_vec();
                play(videos, options, NO_FAVORITES).await?;
            }
        }
    }

    Ok(())
}

fn save(store: &Store) -> Result<()> {
    store
        .save()
        .with_context(|| format!("saving data to {}", store.dir().display()))
}

async fn search(
    store: &mut Store,
    proxy: &ProxyClient,
    query: &str,
    max: u32,
    favorite: Option<usize>,
) -> Result<()> {
    store.recent.record(query);
    save(store)?;

    let videos = match proxy.search(query, max).await {
        Ok(videos) => videos,
        Err(e) => {
            if e.needs_api_key_setup() {
                print_api_key_setup();
            }
            return Err(e).context("search failed");
        }
    };

    if videos.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    for (i, video) in videos.iter().enumerate() {
        let marker = if store.favorites.contains(&video.id) { "★" } else { " " };
        println!("{:>2}. {} {}", i + 1, marker, describe_video(video));
    }

    if let Some(n) = favorite {
        let video = n
            .checked_sub(1)
            .and_then(|index| videos.get(index))
            .with_context(|| format!("no result number {n}"))?;

        match store.favorites.add(video.clone()) {
            AddOutcome::Added => {
                save(store)?;
                println!("Added '{}' to favorites.", video.title);
            }
            AddOutcome::AlreadyPresent => println!("Already in favorites"),
        }
    }

    Ok(())
}

fn print_api_key_setup() {
    eprintln!("The SoundWave server has no YouTube API key configured.");
    eprintln!("  1. Create an API key with the YouTube Data API v3 enabled");
    eprintln!("     (Google Cloud console, APIs & Services)");
    eprintln!("  2. export YOUTUBE_API_KEY=<your key>");
    eprintln!("  3. Restart `soundwave serve`");
}

fn describe_video(video: &Video) -> String {
    if video.duration.is_empty() {
        format!("{} - {}", video.title, video.channel_title)
    } else {
        format!("{} - {} [{}]", video.title, video.channel_title, video.duration)
    }
}

fn print_favorites(videos: &[Video]) {
    if videos.is_empty() {
        println!("No favorites yet.");
        return;
    }
    for video in videos {
        println!("{}  {}", video.id, describe_video(video));
    }
}

fn print_suggestions(body: &SuggestionsBody) {
    if body.suggestions.is_empty() {
        println!("(no suggestions)");
    }
    for suggestion in &body.suggestions {
        println!("  {suggestion}");
    }
    if body.fallback {
        println!("  (suggestion service unavailable, showing generated completions)");
    }
}

type SuggestResult = (Generation, String, Result<SuggestionsBody, ProxyError>);

// Each line is a keystroke-level update of the query. Fetches are debounced
// and answers for anything but the newest query are dropped.
async fn suggest_prompt(proxy: ProxyClient) -> Result<()> {
    println!("Type a query and press Enter for suggestions (Ctrl+D to quit).");

    let (tx, mut rx) = mpsc::unbounded_channel::<SuggestResult>();
    let mut debouncer = Debouncer::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_closed = false;
    let mut awaiting = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if !input_closed => {
                match line.context("reading queries")? {
                    Some(line) => {
                        let query = line.trim().to_string();
                        if query.is_empty() {
                            debouncer.cancel();
                            awaiting = false;
                            continue;
                        }
                        awaiting = true;
                        let proxy = proxy.clone();
                        let tx = tx.clone();
                        debouncer.schedule(move |generation| async move {
                            let result = proxy.suggestions(&query).await;
                            let _ = tx.send((generation, query, result));
                        });
                    }
                    None => {
                        input_closed = true;
                        if !awaiting {
                            break;
                        }
                    }
                }
            }
            Some((generation, query, result)) = rx.recv() => {
                if !generation.is_current() {
                    debug!(generation = generation.value(), %query, "dropping stale suggestions");
                    continue;
                }
                awaiting = false;
                match result {
                    Ok(body) => {
                        println!("{query}:");
                        print_suggestions(&body);
                    }
                    Err(e) => eprintln!("Suggestions failed: {e}"),
                }
                if input_closed {
                    break;
                }
            }
            _ = tokio::time::sleep(SUGGEST_DRAIN), if input_closed => break,
        }
    }

    Ok(())
}

fn library(store: &mut Store, action: LibraryAction) -> Result<()> {
    match action {
        LibraryAction::Add { file, title, artist, duration } => {
            if !is_audio_file(&file) {
                bail!(
                    "{} is not an audio file (expected one of: {})",
                    file.display(),
                    AUDIO_EXTENSIONS.join(", ")
                );
            }
            if !duration.is_finite() || duration < 0.0 {
                bail!("duration must be a non-negative number of seconds, got {duration}");
            }
            let artist = artist.trim();
            if artist.is_empty() {
                bail!("an artist is required");
            }
            let path = std::fs::canonicalize(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let title = match title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
                Some(title) => title,
                None => title_from_path(&path).context("cannot derive a title from the file name")?,
            };

            let song = store
                .library
                .add(&title, artist, &path.to_string_lossy(), duration)
                .clone();
            save(store)?;
            println!("Added '{}' by {} ({}).", song.title, song.artist, song.id);
        }

        LibraryAction::List => {
            if store.library.is_empty() {
                println!("Your library is empty.");
            }
            for song in store.library.songs() {
                let length = format_time(song.duration);
                println!("{}  {} - {} [{}]", song.id, song.title, song.artist, length);
            }
        }

        LibraryAction::Remove { id } => {
            let title = store
                .library
                .get(&id)
                .map(|song| song.title.clone())
                .with_context(|| format!("no song with id {id}"))?;
            store.library.remove(&id);
            save(store)?;
            println!("Removed '{title}' from library.");
        }
    }
    Ok(())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn title_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .filter(|stem| !stem.is_empty())
}

struct PlayOptions {
    shuffle: bool,
    repeat: bool,
    open: bool,
    start: Option<String>,
}

async fn play<T: Playable>(items: Vec<T>, options: PlayOptions, empty_message: &str) -> Result<()> {
    let mut queue = Queue::new(items);
    queue.set_shuffle(options.shuffle);
    queue.set_repeat(options.repeat);

    let mut session = PlayerSession::new(queue, options.open);
    if session.start(options.start.as_deref()).is_none() {
        println!("{empty_message}");
        return Ok(());
    }
    session.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::collections::HashMap;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_search_with_favorite() {
        let argv = ["soundwave", "search", "lofi", "beats", "--favorite", "2"];
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Command::Search { query, max, favorite } => {
                assert_eq!(query.join(" "), "lofi beats");
                assert_eq!(max, 12);
                assert_eq!(favorite, Some(2));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn library_add_requires_artist() {
        assert!(Args::try_parse_from(["soundwave", "library", "add", "song.mp3"]).is_err());
        let with_artist = ["soundwave", "library", "add", "song.mp3", "--artist", "Me"];
        assert!(Args::try_parse_from(with_artist).is_ok());
    }

    #[test]
    fn global_flags_override_config() {
        let args = Args::try_parse_from([
            "soundwave",
            "whoami",
            "--data-dir",
            "/tmp/sw",
            "--server-url",
            "http://10.0.0.2:4000",
        ])
        .unwrap();
        let vars = HashMap::from([("SOUNDWAVE_DATA_DIR".to_string(), "/elsewhere".to_string())]);
        let mut config = Config::from_vars(vars).unwrap();

        args.apply_to(&mut config);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/sw"));
        assert_eq!(config.server_url, "http://10.0.0.2:4000");
    }

    #[test]
    fn audio_extensions() {
        assert!(is_audio_file(Path::new("a/b/track.MP3")));
        assert!(is_audio_file(Path::new("track.opus")));
        assert!(!is_audio_file(Path::new("notes.txt")));
        assert!(!is_audio_file(Path::new("no_extension")));
    }

    #[test]
    fn title_comes_from_file_stem() {
        assert_eq!(title_from_path(Path::new("/music/My Song.flac")).as_deref(), Some("My Song"));
        assert_eq!(title_from_path(Path::new("/music/live.set.mp3")).as_deref(), Some("live.set"));
    }

    #[test]
    fn library_add_and_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Night Drive.mp3");
        std::fs::write(&file, b"not really audio").unwrap();
        let mut store = Store::load(dir.path().join("data")).unwrap();

        library(
            &mut store,
            LibraryAction::Add { file, title: None, artist: "Synth".to_string(), duration: 185.0 },
        )
        .unwrap();
        assert_eq!(store.library.songs()[0].title, "Night Drive");

        let reloaded = Store::load(dir.path().join("data")).unwrap();
        let id = reloaded.library.songs()[0].id.clone();
        assert_eq!(reloaded.library.songs()[0].artist, "Synth");

        library(&mut store, LibraryAction::Remove { id }).unwrap();
        assert!(store.library.is_empty());
    }

    #[test]
    fn library_add_rejects_infinite_duration_and_store_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.mp3");
        std::fs::write(&file, b"audio").unwrap();
        let data = dir.path().join("data");
        let mut store = Store::load(&data).unwrap();

        let args = Args::try_parse_from([
            "soundwave", "library", "add", "x.mp3", "--artist", "A", "--duration", "inf",
        ])
        .unwrap();
        let Command::Library { action: LibraryAction::Add { duration, .. } } = args.command else {
            panic!("expected library add");
        };
        assert!(duration.is_infinite());

        let err = library(
            &mut store,
            LibraryAction::Add {
                file: file.clone(),
                title: None,
                artist: "A".to_string(),
                duration,
            },
        );
        assert!(err.is_err());

        let finite = LibraryAction::Add {
            file,
            title: None,
            artist: "A".to_string(),
            duration: 12.0,
        };
        library(&mut store, finite).unwrap();
        let reloaded = Store::load(&data).unwrap();
        assert_eq!(reloaded.library.songs()[0].duration, 12.0);
    }

    #[test]
    fn library_add_rejects_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"text").unwrap();
        let mut store = Store::load(dir.path()).unwrap();

        let err = library(
            &mut store,
            LibraryAction::Add { file, title: None, artist: "X".to_string(), duration: 0.0 },
        );
        assert!(err.is_err());
        assert!(store.library.is_empty());
    }
}
