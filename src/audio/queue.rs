use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::track::Track;

/// Modos de repetición de una sesión.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    Track,
    Queue,
}

/// Cola de reproducción en memoria de una sesión.
///
/// `previous` guarda el historial con el más reciente primero.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    pub tracks: VecDeque<Track>,
    pub previous: Vec<Track>,
    pub current: Option<Track>,
}

impl Queue {
    /// Agrega un track al final de la cola.
    pub fn enqueue(&mut self, track: Track) {
        debug!("➕ Agregado a la cola: {}", track.info.title);
        self.tracks.push_back(track);
    }

    /// Agrega tracks hasta el tamaño máximo permitido; devuelve cuántos entraron.
    pub fn enqueue_capped(&mut self, tracks: impl IntoIterator<Item = Track>, max: usize) -> usize {
        let available = max.saturating_sub(self.tracks.len());
        let mut added = 0;
        for track in tracks.into_iter().take(available) {
            self.tracks.push_back(track);
            added += 1;
        }
        added
    }

    /// Toma el siguiente track de la cola y lo vuelve el actual.
    pub fn pop_next(&mut self) -> Option<Track> {
        let next = self.tracks.pop_front()?;
        self.current = Some(next.clone());
        Some(next)
    }

    /// Inserta un track al frente del historial si aún no está; devuelve si se insertó.
    pub fn remember(&mut self, track: &Track) -> bool {
        if self.previous.iter().any(|t| t.is_same(track)) {
            return false;
        }
        self.previous.insert(0, track.clone());
        true
    }
}

/// Proyección durable de la cola de una sesión: el valor del registro almacenado.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredQueue {
    pub tracks: Vec<Track>,
    pub previous: Vec<Track>,
    pub current: Option<Track>,
    pub flags: QueueFlags,
}

/// Banderas de sesión que viajan junto a la cola persistida.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueFlags {
    pub autoplay: bool,
    pub repeat: RepeatMode,
}

impl StoredQueue {
    /// El centinela vacío: equivale a "nunca persistido".
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
            && self.previous.is_empty()
            && self.current.is_none()
            && self.flags == QueueFlags::default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::track;

    #[test]
    fn remember_deduplicates_by_identifier() {
        let mut queue = Queue::default();
        let a = track("a", "spotify");

        assert!(queue.remember(&a));
        assert!(!queue.remember(&a));
        assert_eq!(queue.previous.len(), 1);

        let b = track("b", "youtube");
        assert!(queue.remember(&b));
        // el más reciente queda primero
        assert_eq!(queue.previous[0].info.identifier, "b");
    }

    #[test]
    fn enqueue_capped_respects_max() {
        let mut queue = Queue::default();
        queue.enqueue(track("x", "youtube"));

        let added = queue.enqueue_capped((0..5).map(|i| track(&format!("t{i}"), "youtube")), 3);
        assert_eq!(added, 2);
        assert_eq!(queue.tracks.len(), 3);
    }

    #[test]
    fn pop_next_promotes_to_current() {
        let mut queue = Queue::default();
        queue.enqueue(track("a", "youtube"));

        let next = queue.pop_next().unwrap();
        assert_eq!(next.info.identifier, "a");
        assert_eq!(queue.current, Some(next));
        assert!(queue.pop_next().is_none());
    }

    #[test]
    fn stored_queue_empty_sentinel() {
        assert!(StoredQueue::default().is_empty());

        let record = StoredQueue {
            current: Some(track("a", "spotify")),
            ..Default::default()
        };
        assert!(!record.is_empty());

        let flagged = StoredQueue {
            flags: QueueFlags { autoplay: true, repeat: RepeatMode::Off },
            ..Default::default()
        };
        assert!(!flagged.is_empty());
    }
}
