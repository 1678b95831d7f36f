//! Tracker behaviour against an in-memory card
//!
//! Every check on persisted state reloads the state file from the store,
//! so it observes what would survive a power cut.

use pocket_core::{EventKind, FileStore, MediaKind, PersistedState, PlayerConfig, TrackProbe};
use pocket_playback::{PlaybackError, Tracker};
use pocket_storage::{MemoryFileStore, PersistenceEngine, StateFormat};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ===== Test Helpers =====

const STATE: &str = "/sd/state.yaml";

#[derive(Default)]
struct FakeProbe {
    tracks: HashMap<PathBuf, (MediaKind, u32)>,
    /// Snapshot of the state file each time a track is probed
    probed: RefCell<Vec<(PathBuf, PersistedState)>>,
    store: Option<MemoryFileStore>,
}

impl TrackProbe for FakeProbe {
    fn duration_seconds(&self, path: &Path) -> Option<u32> {
        self.tracks.get(path).map(|(_, duration)| *duration)
    }

    fn media_kind(&self, path: &Path) -> MediaKind {
        if let Some(store) = &self.store {
            self.probed
                .borrow_mut()
                .push((path.to_path_buf(), on_card(store)));
        }
        self.tracks
            .get(path)
            .map_or(MediaKind::Music, |(kind, _)| *kind)
    }
}

fn song(name: &str) -> PathBuf {
    PathBuf::from(format!("/music/{name}.mp3"))
}

fn ep(name: &str) -> PathBuf {
    PathBuf::from(format!("/podcasts/{name}.mp3"))
}

/// State as a fresh boot would see it
fn on_card(store: &MemoryFileStore) -> PersistedState {
    let bytes = store.read_file(Path::new(STATE)).unwrap();
    StateFormat::Yaml.decode(&bytes).unwrap()
}

struct Harness {
    store: MemoryFileStore,
    probe: Rc<FakeProbe>,
    tracker: Tracker,
}

impl Harness {
    fn new(tracks: &[(PathBuf, MediaKind, u32)]) -> Self {
        Self::with_config(tracks, &PlayerConfig::default())
    }

    fn with_config(tracks: &[(PathBuf, MediaKind, u32)], config: &PlayerConfig) -> Self {
        let store = MemoryFileStore::new();
        for (path, _, _) in tracks {
            store.insert(path.clone(), "audio");
        }

        let probe = Rc::new(FakeProbe {
            tracks: tracks
                .iter()
                .map(|(path, kind, duration)| (path.clone(), (*kind, *duration)))
                .collect(),
            probed: RefCell::default(),
            store: Some(store.clone()),
        });

        let tracker = boot(&store, &probe, config);
        Self {
            store,
            probe,
            tracker,
        }
    }

    fn reboot(&self) -> Tracker {
        boot(&self.store, &self.probe, &PlayerConfig::default())
    }

    fn events(&mut self) -> Vec<EventKind> {
        self.tracker.drain_events()
    }

    fn card(&self) -> PersistedState {
        on_card(&self.store)
    }
}

fn boot(store: &MemoryFileStore, probe: &Rc<FakeProbe>, config: &PlayerConfig) -> Tracker {
    let mut engine = PersistenceEngine::new(Rc::new(store.clone()), STATE, StateFormat::Yaml);
    engine.load();
    Tracker::new(config, engine, Rc::clone(probe) as Rc<dyn TrackProbe>)
}

fn two_podcasts() -> Harness {
    Harness::new(&[
        (ep("one"), MediaKind::Podcast, 600),
        (ep("two"), MediaKind::Podcast, 600),
    ])
}

fn three_songs() -> Harness {
    Harness::new(&[
        (song("a"), MediaKind::Music, 200),
        (song("b"), MediaKind::Music, 200),
        (song("c"), MediaKind::Music, 200),
    ])
}

// ===== Flush Ordering =====

#[test]
fn test_skip_flushes_outgoing_before_new_session() {
    let mut h = two_podcasts();
    h.tracker.play(vec![ep("one"), ep("two")], 0).unwrap();
    h.tracker.on_tick(45_000);
    h.tracker.on_tick(3_000);

    h.tracker.skip_forward().unwrap();

    // When the next track was probed, its predecessor was already durable
    let probed = h.probe.probed.borrow();
    let (path, snapshot) = probed.last().unwrap();
    assert_eq!(*path, ep("two"));
    assert_eq!(snapshot.podcast(&ep("one")).unwrap().position_seconds, 48);
    assert_eq!(snapshot.current_track.as_ref().unwrap().position_seconds, 48);

    assert_eq!(h.card().podcast(&ep("one")).unwrap().position_seconds, 48);
}

#[test]
fn test_podcast_resumes_where_it_left_off() {
    let mut h = two_podcasts();
    h.tracker.play(vec![ep("one"), ep("two")], 0).unwrap();
    h.tracker.on_tick(30_000);
    h.tracker.skip_forward().unwrap();

    h.tracker.play(vec![ep("one"), ep("two")], 0).unwrap();
    assert_eq!(h.tracker.session().unwrap().position_seconds, 30);
}

#[test]
fn test_music_always_starts_at_zero() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a"), song("b")], 0).unwrap();
    h.tracker.on_tick(30_000);
    h.tracker.skip_forward().unwrap();

    h.tracker.play(vec![song("a")], 0).unwrap();
    assert_eq!(h.tracker.session().unwrap().position_seconds, 0);
}

// ===== Played Flag =====

#[test]
fn test_played_flag_latches_and_only_mark_unplayed_clears() {
    let mut h = Harness::new(&[(ep("one"), MediaKind::Podcast, 100)]);
    h.tracker.play(vec![ep("one")], 0).unwrap();

    h.tracker.sync_position(94).unwrap();
    assert!(!h.card().podcast(&ep("one")).unwrap().played);

    // Crossing the threshold saves immediately
    h.tracker.sync_position(96).unwrap();
    assert!(h.card().podcast(&ep("one")).unwrap().played);

    h.tracker.sync_position(98).unwrap();
    h.tracker.sync_position(10).unwrap();
    h.tracker.toggle_pause().unwrap();
    let meta = h.card().podcast(&ep("one")).cloned().unwrap();
    assert!(meta.played);
    assert_eq!(meta.position_seconds, 10);

    h.tracker.mark_unplayed(&ep("one"));
    assert!(!h.card().podcast(&ep("one")).unwrap().played);
}

#[test]
fn test_played_podcast_restarts_from_zero() {
    let mut h = two_podcasts();
    h.tracker.play(vec![ep("one"), ep("two")], 0).unwrap();
    h.tracker.sync_position(598).unwrap();
    h.tracker.skip_forward().unwrap();

    h.tracker.play(vec![ep("one")], 0).unwrap();
    assert_eq!(h.tracker.session().unwrap().position_seconds, 0);
}

#[test]
fn test_music_never_gets_played_flag() {
    let mut h = Harness::new(&[(song("a"), MediaKind::Music, 100)]);
    h.tracker.play(vec![song("a")], 0).unwrap();
    h.tracker.sync_position(99).unwrap();
    h.tracker.toggle_pause().unwrap();

    assert!(h.card().podcasts.is_empty());
}

#[test]
fn test_unknown_duration_never_marks_played() {
    let mut h = Harness::new(&[(ep("one"), MediaKind::Podcast, 0)]);
    h.tracker.play(vec![ep("one")], 0).unwrap();
    h.tracker.sync_position(5_000).unwrap();
    h.tracker.toggle_pause().unwrap();

    let meta = h.card().podcast(&ep("one")).cloned().unwrap();
    assert!(!meta.played);
    assert_eq!(meta.position_seconds, 5_000);
}

// ===== Save Points =====

#[test]
fn test_pause_is_a_save_point() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a")], 0).unwrap();
    h.tracker.on_tick(4_000);
    assert_eq!(h.card().current_track.unwrap().position_seconds, 0);

    assert!(h.tracker.toggle_pause().unwrap());
    assert_eq!(h.card().current_track.unwrap().position_seconds, 4);

    assert!(!h.tracker.toggle_pause().unwrap());
    assert_eq!(
        h.events(),
        vec![
            EventKind::TrackChanged { path: song("a") },
            EventKind::PlaybackPaused,
            EventKind::PlaybackResumed,
        ]
    );
}

#[test]
fn test_periodic_bookmark_every_interval() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a")], 0).unwrap();

    for _ in 0..9 {
        h.tracker.on_tick(1_000);
    }
    assert_eq!(h.card().current_track.unwrap().position_seconds, 0);

    h.tracker.on_tick(1_000);
    assert_eq!(h.card().current_track.unwrap().position_seconds, 10);
}

#[test]
fn test_paused_ticks_do_not_advance() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a")], 0).unwrap();
    h.tracker.toggle_pause().unwrap();
    let writes = h.store.write_count();

    h.tracker.on_tick(60_000);

    assert_eq!(h.tracker.session().unwrap().position_seconds, 0);
    assert_eq!(h.store.write_count(), writes);
}

#[test]
fn test_external_pause_is_idempotent() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a")], 0).unwrap();
    h.tracker.on_tick(2_000);

    h.tracker.set_paused(true);
    let writes = h.store.write_count();
    h.tracker.set_paused(true);

    assert_eq!(h.store.write_count(), writes);
    assert_eq!(h.card().current_track.unwrap().position_seconds, 2);
    assert!(h.tracker.session().unwrap().is_paused);
}

// ===== Write Failures =====

#[test]
fn test_unsaved_indicator_after_repeated_failures() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a")], 0).unwrap();
    h.tracker.on_tick(2_000);
    h.events();

    h.store.fail_next_writes(2);
    h.tracker.toggle_pause().unwrap();
    assert!(!h.tracker.is_unsaved());

    h.tracker.on_tick(1_000);
    assert!(h.tracker.is_unsaved());

    h.tracker.on_tick(1_000);
    assert!(!h.tracker.is_unsaved());
    assert_eq!(h.card().current_track.unwrap().position_seconds, 2);

    assert_eq!(
        h.events(),
        vec![
            EventKind::PlaybackPaused,
            EventKind::PersistenceStatus { unsaved: true },
            EventKind::PersistenceStatus { unsaved: false },
        ]
    );
}

// ===== Queue Navigation =====

#[test]
fn test_skip_forward_skips_missing_files() {
    let mut h = three_songs();
    h.store.remove_file(&song("b")).unwrap();

    h.tracker.play(vec![song("a"), song("b"), song("c")], 0).unwrap();
    h.tracker.skip_forward().unwrap();

    let session = h.tracker.session().unwrap();
    assert_eq!(session.file_path, song("c"));
    assert_eq!(session.queue_index, 2);
}

#[test]
fn test_play_skips_missing_start() {
    let mut h = three_songs();
    h.store.remove_file(&song("a")).unwrap();

    h.tracker.play(vec![song("a"), song("b")], 0).unwrap();
    assert_eq!(h.tracker.session().unwrap().file_path, song("b"));
}

#[test]
fn test_play_rejects_bad_queues() {
    let mut h = three_songs();
    assert!(matches!(
        h.tracker.play(Vec::new(), 0),
        Err(PlaybackError::EmptyQueue)
    ));
    assert!(matches!(
        h.tracker.play(vec![song("a")], 3),
        Err(PlaybackError::IndexOutOfBounds(3))
    ));
    assert!(matches!(
        h.tracker.play(vec![song("zzz")], 0),
        Err(PlaybackError::EndOfQueue)
    ));
    assert!(matches!(
        h.tracker.skip_forward(),
        Err(PlaybackError::NoSession)
    ));
}

#[test]
fn test_skip_backward_restarts_after_threshold() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a"), song("b")], 1).unwrap();
    h.tracker.on_tick(5_000);
    h.events();

    h.tracker.skip_backward().unwrap();

    let session = h.tracker.session().unwrap();
    assert_eq!(session.file_path, song("b"));
    assert_eq!(session.position_seconds, 0);
    assert_eq!(h.events(), vec![EventKind::TrackChanged { path: song("b") }]);
}

#[test]
fn test_skip_backward_goes_to_previous_near_start() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a"), song("b")], 1).unwrap();
    h.tracker.on_tick(2_000);

    h.tracker.skip_backward().unwrap();
    assert_eq!(h.tracker.session().unwrap().file_path, song("a"));

    // Start of queue: restart instead
    h.tracker.skip_backward().unwrap();
    assert_eq!(h.tracker.session().unwrap().file_path, song("a"));
}

#[test]
fn test_track_end_advances_queue() {
    let mut h = Harness::new(&[
        (song("a"), MediaKind::Music, 3),
        (song("b"), MediaKind::Music, 200),
    ]);
    h.tracker.play(vec![song("a"), song("b")], 0).unwrap();
    h.events();

    h.tracker.on_tick(3_000);

    assert_eq!(h.tracker.session().unwrap().file_path, song("b"));
    assert_eq!(h.events(), vec![EventKind::TrackChanged { path: song("b") }]);
}

#[test]
fn test_end_of_queue_pauses() {
    let mut h = Harness::new(&[(song("a"), MediaKind::Music, 3)]);
    h.tracker.play(vec![song("a")], 0).unwrap();
    h.events();

    h.tracker.on_tick(3_000);

    assert!(h.tracker.session().unwrap().is_paused);
    assert_eq!(h.events(), vec![EventKind::PlaybackPaused]);
}

#[test]
fn test_seek_relative_clamps() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a")], 0).unwrap();

    assert_eq!(h.tracker.seek_relative(-30).unwrap(), 0);
    assert_eq!(h.tracker.seek_relative(150).unwrap(), 150);
    assert_eq!(h.tracker.seek_relative(500).unwrap(), 200);
}

#[test]
fn test_adopt_track_flushes_and_ignores_current() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a"), song("b")], 0).unwrap();
    h.tracker.on_tick(7_000);
    h.events();

    h.tracker.adopt_track(&song("a"));
    assert_eq!(h.tracker.session().unwrap().position_seconds, 7);

    h.tracker.adopt_track(&song("b"));
    let session = h.tracker.session().unwrap();
    assert_eq!(session.file_path, song("b"));
    assert_eq!(session.queue_index, 1);
    // Adopted from the bus, so nothing to re-announce
    assert!(h.events().is_empty());
}

// ===== Boot =====

#[test]
fn test_resume_from_bookmark_after_reboot() {
    let mut h = two_podcasts();
    h.tracker.play(vec![ep("one")], 0).unwrap();
    h.tracker.on_tick(42_000);
    h.tracker.toggle_pause().unwrap();

    let mut tracker = h.reboot();
    assert!(tracker.resume_from_bookmark().unwrap());

    let session = tracker.session().unwrap();
    assert_eq!(session.file_path, ep("one"));
    assert_eq!(session.position_seconds, 42);
    assert!(session.is_paused);
    assert_eq!(
        tracker.drain_events(),
        vec![EventKind::TrackChanged { path: ep("one") }]
    );
}

#[test]
fn test_resume_skips_missing_bookmark_file() {
    let mut h = three_songs();
    h.tracker.play(vec![song("a")], 0).unwrap();
    h.store.remove_file(&song("a")).unwrap();

    let mut tracker = h.reboot();
    assert!(!tracker.resume_from_bookmark().unwrap());
    assert!(tracker.session().is_none());
}

// ===== Playlists =====

#[test]
fn test_playlist_passthrough_and_playback() {
    let mut h = three_songs();
    h.tracker.add_to_playlist("Walk", &song("a"));
    h.tracker.add_to_playlist("Walk", &song("gone"));
    h.tracker.add_to_playlist("Walk", &song("c"));
    h.tracker.create_playlist("Empty");

    assert_eq!(h.tracker.playlists(), vec!["Empty", "Walk"]);
    assert_eq!(h.tracker.playlist_entries("Walk"), vec![song("a"), song("c")]);

    h.tracker.play_playlist("Walk").unwrap();
    h.tracker.skip_forward().unwrap();
    assert_eq!(h.tracker.session().unwrap().file_path, song("c"));

    assert!(matches!(
        h.tracker.play_playlist("Empty"),
        Err(PlaybackError::EmptyQueue)
    ));

    h.tracker.remove_from_playlist("Walk", 1);
    h.tracker.delete_playlist("Empty");
    let card = h.card();
    assert_eq!(card.playlists["Walk"], vec![song("a"), song("c")]);
    assert!(!card.playlists.contains_key("Empty"));
}

#[test]
fn test_purge_played_through_tracker() {
    let mut h = two_podcasts();
    h.tracker.play(vec![ep("one"), ep("two")], 0).unwrap();
    h.tracker.sync_position(599).unwrap();
    h.tracker.skip_forward().unwrap();

    assert!(h.tracker.purge_played(false).is_err());
    assert_eq!(h.tracker.purge_played(true).unwrap(), vec![ep("one")]);
    assert!(!h.store.exists(&ep("one")));
    assert!(h.card().podcast(&ep("one")).is_none());
}

#[test]
fn test_purge_spares_the_playing_episode() {
    let mut h = two_podcasts();
    h.tracker.play(vec![ep("one"), ep("two")], 0).unwrap();
    h.tracker.sync_position(599).unwrap();

    assert!(h.tracker.purge_played(true).unwrap().is_empty());
    h.tracker.toggle_pause().unwrap();

    assert!(h.store.exists(&ep("one")));
    let card = h.card();
    assert!(card.podcast(&ep("one")).is_some_and(|meta| meta.played));
    assert_eq!(card.current_track.unwrap().path, ep("one"));

    // Once playback moved on, the next purge takes it and nothing brings it back
    h.tracker.skip_forward().unwrap();
    assert_eq!(h.tracker.purge_played(true).unwrap(), vec![ep("one")]);
    h.tracker.toggle_pause().unwrap();

    let card = h.card();
    assert!(!h.store.exists(&ep("one")));
    assert!(card.podcast(&ep("one")).is_none());
    assert_eq!(card.current_track.unwrap().path, ep("two"));
}
