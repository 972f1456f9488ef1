use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Fact, FactCategory, Language},
    error::FactError,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, warn};

/// Sentinel cursor value: the user is viewing the live fact, not an
/// entry of the history buffer.
const LIVE_CURSOR: isize = -1;

const SPEECH_POLL_INTERVAL: Duration = Duration::from_millis(500);
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Produces one category-labeled fact per call.
#[async_trait]
pub trait FactProvider: Send + Sync {
    async fn fetch_by_category(&self, category: FactCategory) -> Result<Fact, FactError>;
}

/// Translates fact text. Never fails outward: implementations return a
/// deterministic fallback (`"[<code>] " + text`) on any failure.
#[async_trait]
pub trait FactTranslator: Send + Sync {
    async fn translate(&self, text: &str, language: Language) -> String;
}

/// Start/stop/is-active control over text-to-speech. Starting a new
/// utterance stops any in-flight one. `is_active` must tolerate being
/// polled at arbitrary times without side effects.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str, locale: Option<&str>) -> Result<()>;
    async fn stop(&self);
    async fn is_active(&self) -> bool;
}

/// Persistence for the favorites list and display preferences.
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    async fn load_favorites(&self) -> Result<Vec<Fact>>;
    async fn save_favorites(&self, favorites: &[Fact]) -> Result<()>;
    async fn load_background_color(&self) -> Result<Option<String>>;
    async fn save_background_color(&self, color: &str) -> Result<()>;
}

pub struct MissingFactProvider;

#[async_trait]
impl FactProvider for MissingFactProvider {
    async fn fetch_by_category(&self, category: FactCategory) -> Result<Fact, FactError> {
        Err(FactError::Network(format!(
            "fact provider unavailable for category {category}"
        )))
    }
}

pub struct MissingTranslator;

#[async_trait]
impl FactTranslator for MissingTranslator {
    async fn translate(&self, text: &str, language: Language) -> String {
        adapters::translate::fallback_text(text, language)
    }
}

pub struct MissingSpeechSynthesizer;

#[async_trait]
impl SpeechSynthesizer for MissingSpeechSynthesizer {
    async fn speak(&self, _text: &str, _locale: Option<&str>) -> Result<()> {
        Err(anyhow!("speech synthesizer is unavailable"))
    }

    async fn stop(&self) {}

    async fn is_active(&self) -> bool {
        false
    }
}

/// No-op store: loads defaults, drops writes. Favorites survive only
/// for the lifetime of the session.
pub struct EphemeralPreferences;

#[async_trait]
impl PreferencesStore for EphemeralPreferences {
    async fn load_favorites(&self) -> Result<Vec<Fact>> {
        Ok(Vec::new())
    }

    async fn save_favorites(&self, _favorites: &[Fact]) -> Result<()> {
        Ok(())
    }

    async fn load_background_color(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn save_background_color(&self, _color: &str) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl FactProvider for adapters::CategoryFactProvider {
    async fn fetch_by_category(&self, category: FactCategory) -> Result<Fact, FactError> {
        adapters::CategoryFactProvider::fetch_by_category(self, category).await
    }
}

#[async_trait]
impl FactTranslator for adapters::WebTranslateClient {
    async fn translate(&self, text: &str, language: Language) -> String {
        adapters::WebTranslateClient::translate(self, text, language).await
    }
}

#[async_trait]
impl SpeechSynthesizer for adapters::CommandSpeech {
    async fn speak(&self, text: &str, locale: Option<&str>) -> Result<()> {
        adapters::CommandSpeech::speak(self, text, locale).await
    }

    async fn stop(&self) {
        adapters::CommandSpeech::stop(self).await
    }

    async fn is_active(&self) -> bool {
        adapters::CommandSpeech::is_active(self).await
    }
}

#[async_trait]
impl PreferencesStore for storage::Storage {
    async fn load_favorites(&self) -> Result<Vec<Fact>> {
        storage::Storage::load_favorites(self).await
    }

    async fn save_favorites(&self, favorites: &[Fact]) -> Result<()> {
        storage::Storage::save_favorites(self, favorites).await
    }

    async fn load_background_color(&self) -> Result<Option<String>> {
        storage::Storage::load_background_color(self).await
    }

    async fn save_background_color(&self, color: &str) -> Result<()> {
        storage::Storage::save_background_color(self, color).await
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    FactChanged(Option<Fact>),
    FavoritesUpdated(Vec<Fact>),
    SpeechStateChanged(bool),
    BackgroundColorChanged(String),
    Error(String),
}

/// Pull-style view of the session for the presentation boundary.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub current_fact: Option<Fact>,
    pub selected_category: FactCategory,
    pub favorites: Vec<Fact>,
    pub can_retreat: bool,
    pub is_loading: bool,
    pub is_translating: bool,
    pub is_speaking: bool,
    pub error_message: Option<String>,
    pub background_color: Option<String>,
}

struct SessionState {
    current_fact: Option<Fact>,
    history: Vec<Fact>,
    history_cursor: isize,
    next_fact: Option<Fact>,
    favorites: Vec<Fact>,
    selected_category: FactCategory,
    is_loading: bool,
    is_translating: bool,
    is_speaking: bool,
    error_message: Option<String>,
    background_color: Option<String>,
}

impl SessionState {
    fn new(category: FactCategory) -> Self {
        Self {
            current_fact: None,
            history: Vec::new(),
            history_cursor: LIVE_CURSOR,
            next_fact: None,
            favorites: Vec::new(),
            selected_category: category,
            is_loading: false,
            is_translating: false,
            is_speaking: false,
            error_message: None,
            background_color: None,
        }
    }

    fn can_retreat(&self) -> bool {
        !self.history.is_empty() && (self.history_cursor > 0 || self.history_cursor == LIVE_CURSOR)
    }
}

/// The session view-model.
///
/// Owns all session state behind one mutex; every mutation happens
/// inside a command handler on that mutex, so there are no concurrent
/// writers. Commands that fetch hold an `is_loading` guard: a second
/// Advance (or category change) arriving while a fetch is in flight
/// returns without effect instead of racing the first.
pub struct FactSession {
    provider: Arc<dyn FactProvider>,
    translator: Arc<dyn FactTranslator>,
    speech: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn PreferencesStore>,
    inner: Arc<Mutex<SessionState>>,
    prefetch_task: Mutex<Option<JoinHandle<()>>>,
    speech_monitor: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl FactSession {
    pub fn new_with_dependencies(
        provider: Arc<dyn FactProvider>,
        translator: Arc<dyn FactTranslator>,
        speech: Arc<dyn SpeechSynthesizer>,
        store: Arc<dyn PreferencesStore>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            provider,
            translator,
            speech,
            store,
            inner: Arc::new(Mutex::new(SessionState::new(FactCategory::Random))),
            prefetch_task: Mutex::new(None),
            speech_monitor: Mutex::new(None),
            events,
        })
    }

    /// Session wired to null collaborators. Fetches fail, translation
    /// falls back, favorites stay in memory.
    pub fn detached() -> Arc<Self> {
        Self::new_with_dependencies(
            Arc::new(MissingFactProvider),
            Arc::new(MissingTranslator),
            Arc::new(MissingSpeechSynthesizer),
            Arc::new(EphemeralPreferences),
        )
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Loads the persisted favorites and display preferences. Called
    /// once at startup, before the first Advance.
    pub async fn load_persisted(&self) -> Result<()> {
        let favorites = self.store.load_favorites().await?;
        let background_color = self.store.load_background_color().await?;

        let mut inner = self.inner.lock().await;
        inner.favorites = favorites;
        inner.background_color = background_color;
        let _ = self
            .events
            .send(SessionEvent::FavoritesUpdated(inner.favorites.clone()));
        Ok(())
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            current_fact: inner.current_fact.clone(),
            selected_category: inner.selected_category,
            favorites: inner.favorites.clone(),
            can_retreat: inner.can_retreat(),
            is_loading: inner.is_loading,
            is_translating: inner.is_translating,
            is_speaking: inner.is_speaking,
            error_message: inner.error_message.clone(),
            background_color: inner.background_color.clone(),
        }
    }

    /// Forward navigation: push the live fact into history, surface the
    /// pre-fetched fact (or fetch synchronously), then pre-fetch the
    /// next one in the background.
    pub async fn advance(&self) -> Result<()> {
        let (category, prefetched) = {
            let mut inner = self.inner.lock().await;
            if inner.is_loading {
                debug!("session: advance ignored while a fetch is in flight");
                return Ok(());
            }
            inner.is_loading = true;
            inner.error_message = None;
            if inner.history_cursor == LIVE_CURSOR {
                if let Some(current) = inner.current_fact.take() {
                    inner.history.push(current);
                }
            }
            (inner.selected_category, inner.next_fact.take())
        };

        let fetched = match prefetched {
            Some(fact) => Ok(fact),
            None => self.provider.fetch_by_category(category).await,
        };

        {
            let mut inner = self.inner.lock().await;
            match fetched {
                Ok(fact) => {
                    let fact = annotate_favorite(fact, &inner.favorites);
                    inner.current_fact = Some(fact);
                    inner.history_cursor = LIVE_CURSOR;
                }
                Err(err) => {
                    warn!(category = %category, "session: fact fetch failed: {err}");
                    inner.current_fact = None;
                    inner.history_cursor = LIVE_CURSOR;
                    inner.error_message = Some(err.to_string());
                }
            }
            inner.is_loading = false;
            let _ = self
                .events
                .send(SessionEvent::FactChanged(inner.current_fact.clone()));
        }

        self.spawn_prefetch(category).await;
        Ok(())
    }

    /// Backward navigation through the history buffer.
    ///
    /// From the live fact the current fact is pushed first, so the
    /// cursor lands on it and a second Retreat reaches the previous
    /// entry. At `history[0]` this is a no-op.
    pub async fn retreat(&self) {
        let mut inner = self.inner.lock().await;
        if inner.history.is_empty() {
            return;
        }
        if inner.history_cursor == LIVE_CURSOR {
            if let Some(current) = inner.current_fact.take() {
                inner.history.push(current);
            }
            inner.history_cursor = inner.history.len() as isize - 1;
        } else if inner.history_cursor > 0 {
            inner.history_cursor -= 1;
        } else {
            return;
        }
        inner.current_fact = Some(inner.history[inner.history_cursor as usize].clone());
        let _ = self
            .events
            .send(SessionEvent::FactChanged(inner.current_fact.clone()));
    }

    pub async fn can_retreat(&self) -> bool {
        self.inner.lock().await.can_retreat()
    }

    /// Switches category: history and cursor reset, the pre-fetched
    /// fact for the old category is dropped, and a fresh fetch runs.
    pub async fn change_category(&self, category: FactCategory) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            inner.selected_category = category;
            inner.history.clear();
            inner.history_cursor = LIVE_CURSOR;
            inner.next_fact = None;
            inner.current_fact = None;
        }
        self.advance().await
    }

    pub async fn clear_history(&self) {
        let mut inner = self.inner.lock().await;
        inner.history.clear();
        inner.history_cursor = LIVE_CURSOR;
    }

    /// Flips the favorite flag on the displayed fact and keeps the
    /// favorites list in sync, then persists the list.
    pub async fn toggle_favorite(&self) -> Result<()> {
        let favorites = {
            let mut inner = self.inner.lock().await;
            let Some(current) = inner.current_fact.clone() else {
                return Ok(());
            };
            let updated = current.with_favorite(!current.is_favorite);
            if updated.is_favorite {
                if !inner.favorites.iter().any(|fact| fact.text == updated.text) {
                    inner.favorites.push(updated.clone());
                }
            } else {
                inner.favorites.retain(|fact| fact.text != updated.text);
            }
            inner.current_fact = Some(updated);
            let _ = self
                .events
                .send(SessionEvent::FactChanged(inner.current_fact.clone()));
            let _ = self
                .events
                .send(SessionEvent::FavoritesUpdated(inner.favorites.clone()));
            inner.favorites.clone()
        };
        self.store.save_favorites(&favorites).await
    }

    /// Removes `favorites[index]`. If the displayed fact matches by
    /// text its flag is flipped off in place; history is untouched.
    pub async fn remove_favorite(&self, index: usize) -> Result<()> {
        let favorites = {
            let mut inner = self.inner.lock().await;
            if index >= inner.favorites.len() {
                return Ok(());
            }
            let removed = inner.favorites.remove(index);
            if let Some(current) = inner.current_fact.clone() {
                if current.text == removed.text {
                    inner.current_fact = Some(current.with_favorite(false));
                    let _ = self
                        .events
                        .send(SessionEvent::FactChanged(inner.current_fact.clone()));
                }
            }
            let _ = self
                .events
                .send(SessionEvent::FavoritesUpdated(inner.favorites.clone()));
            inner.favorites.clone()
        };
        self.store.save_favorites(&favorites).await
    }

    /// Translates the displayed fact. A repeat request for the language
    /// already carried by the fact is a no-op; when browsing history
    /// the translated record is mirrored into `history[cursor]`.
    pub async fn translate_current_fact(&self, language: Language) -> Result<()> {
        let text = {
            let mut inner = self.inner.lock().await;
            let Some(current) = inner.current_fact.as_ref() else {
                return Ok(());
            };
            if current.translation_language == Some(language) && current.translated_text.is_some() {
                debug!(language = language.code(), "session: translation already present");
                let _ = self
                    .events
                    .send(SessionEvent::FactChanged(inner.current_fact.clone()));
                return Ok(());
            }
            if inner.is_translating {
                return Ok(());
            }
            let text = current.text.clone();
            inner.is_translating = true;
            text
        };

        let translated = self.translator.translate(&text, language).await;

        let mut inner = self.inner.lock().await;
        inner.is_translating = false;
        if let Some(current) = inner.current_fact.clone() {
            // The displayed fact may have changed while the request ran.
            if current.text == text {
                let updated = current.with_translation(translated, language);
                if inner.history_cursor >= 0 {
                    let cursor = inner.history_cursor as usize;
                    inner.history[cursor] = updated.clone();
                }
                inner.current_fact = Some(updated);
                let _ = self
                    .events
                    .send(SessionEvent::FactChanged(inner.current_fact.clone()));
            }
        }
        Ok(())
    }

    /// Clears translation fields on the displayed fact and, when
    /// browsing history, on the mirrored history entry.
    pub async fn reset_translation(&self) {
        let mut inner = self.inner.lock().await;
        let Some(current) = inner.current_fact.clone() else {
            return;
        };
        let updated = current.without_translation();
        if inner.history_cursor >= 0 {
            let cursor = inner.history_cursor as usize;
            inner.history[cursor] = updated.clone();
        }
        inner.current_fact = Some(updated);
        let _ = self
            .events
            .send(SessionEvent::FactChanged(inner.current_fact.clone()));
    }

    /// Reads the displayed text (translation when present) aloud and
    /// starts the completion poll.
    pub async fn speak_current_fact(&self) -> Result<()> {
        let (text, locale) = {
            let inner = self.inner.lock().await;
            let Some(current) = inner.current_fact.as_ref() else {
                return Ok(());
            };
            let locale = current
                .translation_language
                .map(|language| language.speech_locale().to_string());
            (current.display_text().to_string(), locale)
        };

        if let Err(err) = self.speech.speak(&text, locale.as_deref()).await {
            warn!("session: speech synthesis failed to start: {err}");
            let _ = self
                .events
                .send(SessionEvent::Error(format!("speech unavailable: {err}")));
            return Ok(());
        }

        {
            let mut inner = self.inner.lock().await;
            inner.is_speaking = true;
        }
        let _ = self.events.send(SessionEvent::SpeechStateChanged(true));
        self.spawn_speech_monitor().await;
        Ok(())
    }

    pub async fn stop_speaking(&self) {
        self.speech.stop().await;
        if let Some(task) = self.speech_monitor.lock().await.take() {
            task.abort();
        }
        let mut inner = self.inner.lock().await;
        if inner.is_speaking {
            inner.is_speaking = false;
            let _ = self.events.send(SessionEvent::SpeechStateChanged(false));
        }
    }

    pub async fn is_speaking(&self) -> bool {
        self.inner.lock().await.is_speaking
    }

    pub async fn set_background_color(&self, color: &str) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            inner.background_color = Some(color.to_string());
        }
        let _ = self
            .events
            .send(SessionEvent::BackgroundColorChanged(color.to_string()));
        self.store.save_background_color(color).await
    }

    /// Best-effort look-ahead fetch into the single `next_fact` slot.
    /// Failures are logged and invisible; a result for a category the
    /// user has already left is dropped.
    async fn spawn_prefetch(&self, category: FactCategory) {
        let provider = Arc::clone(&self.provider);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            match provider.fetch_by_category(category).await {
                Ok(fact) => {
                    let mut inner = inner.lock().await;
                    if inner.selected_category == category {
                        inner.next_fact = Some(fact);
                    } else {
                        debug!(category = %category, "session: dropping prefetched fact for stale category");
                    }
                }
                Err(err) => {
                    debug!(category = %category, "session: prefetch failed: {err}");
                }
            }
        });
        let mut guard = self.prefetch_task.lock().await;
        if let Some(previous) = guard.replace(task) {
            previous.abort();
        }
    }

    /// Polls the synthesizer every 500ms until the utterance ends,
    /// then clears the speaking flag. Replaced (and the old poll
    /// aborted) when a new utterance starts.
    async fn spawn_speech_monitor(&self) {
        let speech = Arc::clone(&self.speech);
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SPEECH_POLL_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !speech.is_active().await {
                    {
                        let mut inner = inner.lock().await;
                        inner.is_speaking = false;
                    }
                    let _ = events.send(SessionEvent::SpeechStateChanged(false));
                    break;
                }
            }
        });
        let mut guard = self.speech_monitor.lock().await;
        if let Some(previous) = guard.replace(task) {
            previous.abort();
        }
    }
}

/// Re-applies the favorite flag from list membership (matched by text)
/// whenever a fact is loaded.
fn annotate_favorite(fact: Fact, favorites: &[Fact]) -> Fact {
    let is_favorite = favorites.iter().any(|favorite| favorite.text == fact.text);
    fact.with_favorite(is_favorite)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
