//! The palette store.
//!
//! [`PaletteStore`] is the single owner of the session's palettes and display
//! format. Every mutating call updates memory and writes exactly one full
//! record before returning, so no caller can observe one without the other.
//! The store is driven through `&mut self`; callers sharing it across threads
//! wrap it in one `Mutex`, which then covers both the list and its write.

use std::collections::HashSet;
use std::sync::Arc;

use swatch_types::{ColorEntry, ColorFormat, DEFAULT_COLOR, Palette, PersistedColor};
use swatch_util::{IdGenerator, RecordOptions, RecordStore, RecordStoreError};
use tracing::{debug, warn};

use crate::codec::{FORMAT_KEY, encode_palette, palette_key};
use crate::error::{PaletteError, ReorderViolation, WriteOutcome};
use crate::loader::{LoadReport, load_format, load_palettes};

/// Attempts at drawing an unused id before falling back to a numbered suffix.
const MAX_ID_ATTEMPTS: usize = 16;

/// Draw an id from `ids` that `taken` does not reject.
pub(crate) fn fresh_id(ids: &dyn IdGenerator, taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = ids.generate();
    for _ in 1..MAX_ID_ATTEMPTS {
        if !taken(&candidate) {
            return candidate;
        }
        candidate = ids.generate();
    }
    let mut suffix = 1usize;
    let base = candidate;
    loop {
        let numbered = format!("{base}-{suffix}");
        if !taken(&numbered) {
            return numbered;
        }
        suffix += 1;
    }
}

pub struct PaletteStore {
    records: Arc<dyn RecordStore>,
    ids: Arc<dyn IdGenerator>,
    palettes: Vec<Arc<Palette>>,
    format: ColorFormat,
    expiry_days: Option<u32>,
    /// Palettes whose in-memory order differs from their record.
    pending_order: HashSet<String>,
    /// Every palette uuid seen this session, deleted ones included.
    issued: HashSet<String>,
}

impl PaletteStore {
    /// An empty store with the `hex` format.
    pub fn new(records: Arc<dyn RecordStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            records,
            ids,
            palettes: Vec::new(),
            format: ColorFormat::default(),
            expiry_days: None,
            pending_order: HashSet::new(),
            issued: HashSet::new(),
        }
    }

    /// Override the lifetime given to every record this store writes.
    pub fn with_expiry_days(mut self, days: u32) -> Self {
        self.expiry_days = Some(days);
        self
    }

    /// Build a store hydrated from the records already present in `records`.
    pub fn open(records: Arc<dyn RecordStore>, ids: Arc<dyn IdGenerator>) -> Result<(Self, LoadReport), RecordStoreError> {
        let mut report = load_palettes(records.as_ref(), ids.as_ref())?;
        let format = load_format(records.as_ref());
        let mut store = Self::new(records, ids);
        // Record keys are unique and the loader assigns fresh color ids.
        store.seed(std::mem::take(&mut report.palettes), format);
        Ok((store, report))
    }

    /// Seed memory without touching storage. A missing format means `hex`.
    ///
    /// Rejects palettes sharing a uuid and palettes holding a color id twice;
    /// nothing changes when an error is returned.
    pub fn initialize(&mut self, palettes: Vec<Palette>, format: Option<ColorFormat>) -> Result<(), PaletteError> {
        let mut uuids = HashSet::with_capacity(palettes.len());
        for palette in &palettes {
            if !uuids.insert(palette.uuid.as_str()) {
                return Err(PaletteError::DuplicatePaletteUuid {
                    uuid: palette.uuid.clone(),
                });
            }
            if let Some(id) = first_duplicate_id(&palette.colors) {
                return Err(PaletteError::DuplicateColorId {
                    uuid: palette.uuid.clone(),
                    id,
                });
            }
        }
        self.seed(palettes, format.unwrap_or_default());
        Ok(())
    }

    fn seed(&mut self, palettes: Vec<Palette>, format: ColorFormat) {
        self.issued.extend(palettes.iter().map(|palette| palette.uuid.clone()));
        self.palettes = palettes.into_iter().map(Arc::new).collect();
        self.format = format;
        self.pending_order.clear();
    }

    pub fn palettes(&self) -> &[Arc<Palette>] {
        &self.palettes
    }

    pub fn palette(&self, uuid: &str) -> Option<&Arc<Palette>> {
        self.palettes.iter().find(|palette| palette.uuid == uuid)
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// True after [`reorder_colors`](Self::reorder_colors) until the order is written.
    pub fn has_pending_order(&self, uuid: &str) -> bool {
        self.pending_order.contains(uuid)
    }

    pub fn change_format(&mut self, format: ColorFormat) -> WriteOutcome {
        self.format = format;
        debug!(format = %format, "format changed");
        self.write(FORMAT_KEY, Ok(format.as_str().to_string()))
    }

    /// Create an empty palette at the front of the list. Returns its uuid,
    /// which is never one this session has handed out before.
    pub fn create_palette(&mut self, name: impl Into<String>) -> (String, WriteOutcome) {
        let uuid = fresh_id(self.ids.as_ref(), |candidate| self.issued.contains(candidate));
        self.issued.insert(uuid.clone());
        let palette = Palette::new(uuid.clone(), name);
        let outcome = self.persist(&palette);
        debug!(uuid = %uuid, "palette created");
        self.palettes.insert(0, Arc::new(palette));
        (uuid, outcome)
    }

    /// Replace a palette's name and colors. Other palettes keep their `Arc`.
    pub fn change_palette(
        &mut self,
        uuid: &str,
        name: impl Into<String>,
        colors: Vec<ColorEntry>,
    ) -> Result<WriteOutcome, PaletteError> {
        let index = self.index_of(uuid)?;
        if let Some(id) = first_duplicate_id(&colors) {
            return Err(PaletteError::DuplicateColorId {
                uuid: uuid.to_string(),
                id,
            });
        }

        let palette = Palette {
            uuid: uuid.to_string(),
            name: name.into(),
            colors,
        };
        Ok(self.commit(index, palette))
    }

    pub fn delete_palette(&mut self, uuid: &str) -> Result<WriteOutcome, PaletteError> {
        let index = self.index_of(uuid)?;
        let key = palette_key(uuid);
        let outcome = match self.records.delete(&key) {
            Ok(()) => WriteOutcome::Persisted,
            Err(error) => not_persisted(key, &error),
        };
        self.palettes.remove(index);
        self.pending_order.remove(uuid);
        debug!(uuid = %uuid, "palette deleted");
        Ok(outcome)
    }

    /// Append a color (white when `color` is `None`). Returns the new color id.
    pub fn add_color(&mut self, uuid: &str, color: Option<PersistedColor>) -> Result<(String, WriteOutcome), PaletteError> {
        let index = self.index_of(uuid)?;
        let mut palette = self.palettes[index].as_ref().clone();
        let id = fresh_id(self.ids.as_ref(), |candidate| palette.contains_color(candidate));
        let color = color.unwrap_or_else(|| DEFAULT_COLOR.into());
        palette.colors.push(ColorEntry::from_persisted(id.clone(), color));
        Ok((id, self.commit(index, palette)))
    }

    /// Replace the values of one color in place.
    pub fn edit_color(&mut self, uuid: &str, id: &str, color: PersistedColor) -> Result<WriteOutcome, PaletteError> {
        let index = self.index_of(uuid)?;
        let mut palette = self.palettes[index].as_ref().clone();
        let position = color_position(&palette, id)?;
        palette.colors[position] = ColorEntry::from_persisted(id, color);
        Ok(self.commit(index, palette))
    }

    /// Insert a copy carrying `color` directly before the color `id`. Returns the copy's id.
    pub fn clone_color(&mut self, uuid: &str, id: &str, color: PersistedColor) -> Result<(String, WriteOutcome), PaletteError> {
        let index = self.index_of(uuid)?;
        let mut palette = self.palettes[index].as_ref().clone();
        let position = color_position(&palette, id)?;
        let clone_id = fresh_id(self.ids.as_ref(), |candidate| palette.contains_color(candidate));
        palette.colors.insert(position, ColorEntry::from_persisted(clone_id.clone(), color));
        Ok((clone_id, self.commit(index, palette)))
    }

    pub fn delete_color(&mut self, uuid: &str, id: &str) -> Result<WriteOutcome, PaletteError> {
        let index = self.index_of(uuid)?;
        let mut palette = self.palettes[index].as_ref().clone();
        let position = color_position(&palette, id)?;
        palette.colors.remove(position);
        Ok(self.commit(index, palette))
    }

    /// Reorder colors in memory only, e.g. while a drag is in progress.
    pub fn reorder_colors<S: AsRef<str>>(&mut self, uuid: &str, ordered_ids: &[S]) -> Result<(), PaletteError> {
        let index = self.index_of(uuid)?;
        let palette = self.reordered(index, ordered_ids)?;
        if palette.colors != self.palettes[index].colors {
            self.pending_order.insert(uuid.to_string());
        }
        self.palettes[index] = Arc::new(palette);
        Ok(())
    }

    /// Apply and write the final order.
    pub fn commit_reorder<S: AsRef<str>>(&mut self, uuid: &str, ordered_ids: &[S]) -> Result<WriteOutcome, PaletteError> {
        let index = self.index_of(uuid)?;
        let palette = self.reordered(index, ordered_ids)?;
        Ok(self.commit(index, palette))
    }

    fn index_of(&self, uuid: &str) -> Result<usize, PaletteError> {
        self.palettes
            .iter()
            .position(|palette| palette.uuid == uuid)
            .ok_or_else(|| PaletteError::PaletteNotFound { uuid: uuid.to_string() })
    }

    fn reordered<S: AsRef<str>>(&self, index: usize, ordered_ids: &[S]) -> Result<Palette, PaletteError> {
        let current = self.palettes[index].as_ref();
        let invalid = |violation| PaletteError::InvalidReorder {
            uuid: current.uuid.clone(),
            violation,
        };
        if ordered_ids.len() != current.colors.len() {
            return Err(invalid(ReorderViolation::LengthMismatch {
                expected: current.colors.len(),
                actual: ordered_ids.len(),
            }));
        }

        let mut seen = HashSet::with_capacity(ordered_ids.len());
        let mut colors = Vec::with_capacity(ordered_ids.len());
        for id in ordered_ids.iter().map(AsRef::as_ref) {
            if !seen.insert(id) {
                return Err(invalid(ReorderViolation::Duplicate(id.to_string())));
            }
            let position = current
                .position_of(id)
                .ok_or_else(|| invalid(ReorderViolation::Unknown(id.to_string())))?;
            colors.push(current.colors[position].clone());
        }

        Ok(Palette {
            uuid: current.uuid.clone(),
            name: current.name.clone(),
            colors,
        })
    }

    /// Write `palette`'s record and publish it at `index`.
    fn commit(&mut self, index: usize, palette: Palette) -> WriteOutcome {
        let outcome = self.persist(&palette);
        self.pending_order.remove(&palette.uuid);
        self.palettes[index] = Arc::new(palette);
        outcome
    }

    fn persist(&self, palette: &Palette) -> WriteOutcome {
        let encoded = encode_palette(palette).map_err(|error| error.to_string());
        self.write(&palette_key(&palette.uuid), encoded)
    }

    fn write(&self, key: &str, value: Result<String, String>) -> WriteOutcome {
        let options = RecordOptions {
            expiry_days: self.expiry_days,
        };
        let value = match value {
            Ok(value) => value,
            Err(reason) => {
                warn!(key = %key, reason = %reason, "Failed to encode record; change kept in memory only");
                return WriteOutcome::NotPersisted {
                    key: key.to_string(),
                    reason,
                };
            }
        };
        match self.records.set(key, &value, options) {
            Ok(()) => WriteOutcome::Persisted,
            Err(error) => not_persisted(key.to_string(), &error),
        }
    }
}

fn not_persisted(key: String, error: &RecordStoreError) -> WriteOutcome {
    warn!(key = %key, error = %error, "Record write failed; change may not survive reload");
    WriteOutcome::NotPersisted {
        key,
        reason: error.to_string(),
    }
}

fn first_duplicate_id(colors: &[ColorEntry]) -> Option<String> {
    let mut seen = HashSet::with_capacity(colors.len());
    colors
        .iter()
        .find(|color| !seen.insert(color.id.as_str()))
        .map(|color| color.id.clone())
}

fn color_position(palette: &Palette, id: &str) -> Result<usize, PaletteError> {
    palette.position_of(id).ok_or_else(|| PaletteError::ColorNotFound {
        uuid: palette.uuid.clone(),
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use swatch_util::{InMemoryRecordStore, SequentialIdGenerator};

    struct Fixture {
        records: Arc<InMemoryRecordStore>,
        store: PaletteStore,
    }

    fn fixture() -> Fixture {
        let records = Arc::new(InMemoryRecordStore::new());
        let store = PaletteStore::new(records.clone(), Arc::new(SequentialIdGenerator::new("id-")));
        Fixture { records, store }
    }

    /// Always returns the same id, forcing the collision fallback.
    struct StuckGenerator;

    impl IdGenerator for StuckGenerator {
        fn generate(&self) -> String {
            "same".to_string()
        }
    }

    fn stored(records: &InMemoryRecordStore, uuid: &str) -> Option<String> {
        records.get(&palette_key(uuid)).unwrap()
    }

    #[test]
    fn create_palette_prepends_and_persists() {
        let Fixture { records, mut store } = fixture();
        let (first, outcome) = store.create_palette("Reds");
        assert!(outcome.is_persisted());
        let (second, _) = store.create_palette("Blues");

        let names: Vec<_> = store.palettes().iter().map(|palette| palette.name.as_str()).collect();
        assert_eq!(names, vec!["Blues", "Reds"]);
        assert_eq!(
            stored(&records, &first).as_deref(),
            Some(format!(r#"{{"uuid":"{first}","name":"Reds","colors":[]}}"#).as_str())
        );
        assert_ne!(first, second);
    }

    #[test]
    fn colliding_ids_are_redrawn() {
        let records = Arc::new(InMemoryRecordStore::new());
        let mut store = PaletteStore::new(records, Arc::new(StuckGenerator));
        let (first, _) = store.create_palette("A");
        let (second, _) = store.create_palette("B");
        let (third, _) = store.create_palette("C");
        assert_eq!(first, "same");
        assert_eq!(second, "same-1");
        assert_eq!(third, "same-2");

        let (color_a, _) = store.add_color(&first, None).unwrap();
        let (color_b, _) = store.add_color(&first, None).unwrap();
        assert_ne!(color_a, color_b);
    }

    #[test]
    fn deleted_uuids_are_not_reissued() {
        let records = Arc::new(InMemoryRecordStore::new());
        let mut store = PaletteStore::new(records, Arc::new(StuckGenerator));
        let (first, _) = store.create_palette("A");
        let _ = store.delete_palette(&first).unwrap();
        let (second, _) = store.create_palette("B");
        assert_eq!(first, "same");
        assert_eq!(second, "same-1");
    }

    #[test]
    fn initialize_rejects_duplicate_palette_uuids() {
        let Fixture { records, mut store } = fixture();
        let error = store
            .initialize(vec![Palette::new("u", "A"), Palette::new("u", "B")], Some(ColorFormat::Rgb))
            .unwrap_err();
        assert_eq!(error, PaletteError::DuplicatePaletteUuid { uuid: "u".into() });
        assert!(store.palettes().is_empty());
        assert_eq!(store.format(), ColorFormat::Hex);

        let (uuid, _) = store.create_palette("Only");
        assert!(store.delete_palette(&uuid).unwrap().is_persisted());
        assert!(store.palettes().is_empty());
        assert!(records.is_empty());
    }

    #[test]
    fn initialize_rejects_duplicate_color_ids() {
        let Fixture { mut store, .. } = fixture();
        let mut palette = Palette::new("u", "A");
        palette.colors = vec![ColorEntry::new("x", "A", "#000000"), ColorEntry::new("x", "B", "#ffffff")];
        let error = store.initialize(vec![palette], None).unwrap_err();
        assert!(matches!(error, PaletteError::DuplicateColorId { ref uuid, ref id } if uuid == "u" && id == "x"));
        assert!(store.palette("u").is_none());
    }

    #[test]
    fn initialized_uuids_are_not_reissued() {
        let records = Arc::new(InMemoryRecordStore::new());
        let mut store = PaletteStore::new(records, Arc::new(StuckGenerator));
        store.initialize(vec![Palette::new("same", "Seeded")], None).unwrap();
        let (uuid, _) = store.create_palette("New");
        assert_eq!(uuid, "same-1");
        assert_eq!(store.palettes().len(), 2);
    }

    #[test]
    fn change_format_updates_memory_and_record() {
        let Fixture { records, mut store } = fixture();
        assert_eq!(store.format(), ColorFormat::Hex);
        assert!(store.change_format(ColorFormat::Hsl).is_persisted());
        assert_eq!(store.format(), ColorFormat::Hsl);
        assert_eq!(records.get(FORMAT_KEY).unwrap().as_deref(), Some("hsl"));
    }

    #[test]
    fn add_color_defaults_to_white() {
        let Fixture { records, mut store } = fixture();
        let (uuid, _) = store.create_palette("P");
        let (id, _) = store.add_color(&uuid, None).unwrap();

        let palette = store.palette(&uuid).unwrap();
        assert_eq!(palette.colors, vec![ColorEntry::new(id, "White", "#ffffff")]);
        assert!(stored(&records, &uuid).unwrap().ends_with(r##""colors":[{"name":"White","hex":"#ffffff"}]}"##));
    }

    #[test]
    fn edit_color_keeps_position() {
        let Fixture { mut store, .. } = fixture();
        let (uuid, _) = store.create_palette("P");
        let (a, _) = store.add_color(&uuid, Some(PersistedColor::new("A", "#000001"))).unwrap();
        let (b, _) = store.add_color(&uuid, Some(PersistedColor::new("B", "#000002"))).unwrap();
        let _ = store.edit_color(&uuid, &a, PersistedColor::new("A2", "#0000aa")).unwrap();

        let palette = store.palette(&uuid).unwrap();
        assert_eq!(palette.colors[0], ColorEntry::new(a, "A2", "#0000aa"));
        assert_eq!(palette.colors[1].id, b);
    }

    #[test]
    fn clone_color_inserts_before_source() {
        let Fixture { records, mut store } = fixture();
        let (uuid, _) = store.create_palette("P");
        let (a, _) = store.add_color(&uuid, Some(PersistedColor::new("A", "#000001"))).unwrap();
        let (b, _) = store.add_color(&uuid, Some(PersistedColor::new("B", "#000002"))).unwrap();
        let (copy, _) = store.clone_color(&uuid, &b, PersistedColor::new("B", "#000002")).unwrap();

        let ids: Vec<_> = store.palette(&uuid).unwrap().colors.iter().map(|color| color.id.clone()).collect();
        assert_eq!(ids, vec![a, copy, b]);
        assert!(stored(&records, &uuid).unwrap().contains(r##"{"name":"A","hex":"#000001"},{"name":"B","hex":"#000002"},{"name":"B""##));
    }

    #[test]
    fn color_operations_report_missing_targets() {
        let Fixture { mut store, .. } = fixture();
        let (uuid, _) = store.create_palette("P");
        let missing_palette = store.add_color("nope", None).unwrap_err();
        assert_eq!(missing_palette, PaletteError::PaletteNotFound { uuid: "nope".into() });

        let missing_color = store.delete_color(&uuid, "ghost").unwrap_err();
        assert_eq!(
            missing_color,
            PaletteError::ColorNotFound {
                uuid: uuid.clone(),
                id: "ghost".into()
            }
        );
        assert!(store.edit_color(&uuid, "ghost", PersistedColor::new("x", "#000000")).is_err());
        assert!(store.clone_color(&uuid, "ghost", PersistedColor::new("x", "#000000")).is_err());
    }

    #[test]
    fn change_palette_rejects_duplicate_ids() {
        let Fixture { mut store, .. } = fixture();
        let (uuid, _) = store.create_palette("P");
        let colors = vec![ColorEntry::new("x", "A", "#000000"), ColorEntry::new("x", "B", "#ffffff")];
        let error = store.change_palette(&uuid, "P", colors).unwrap_err();
        assert!(matches!(error, PaletteError::DuplicateColorId { id, .. } if id == "x"));
        assert!(store.palette(&uuid).unwrap().colors.is_empty());
    }

    #[test]
    fn provisional_reorder_does_not_write() {
        let Fixture { records, mut store } = fixture();
        let (uuid, _) = store.create_palette("P");
        let (a, _) = store.add_color(&uuid, Some(PersistedColor::new("A", "#000001"))).unwrap();
        let (b, _) = store.add_color(&uuid, Some(PersistedColor::new("B", "#000002"))).unwrap();
        let before = stored(&records, &uuid);

        store.reorder_colors(&uuid, &[b.as_str(), a.as_str()]).unwrap();
        assert_eq!(store.palette(&uuid).unwrap().colors[0].id, b);
        assert_eq!(stored(&records, &uuid), before);
        assert!(store.has_pending_order(&uuid));

        let _ = store.commit_reorder(&uuid, &[b.as_str(), a.as_str()]).unwrap();
        assert!(!store.has_pending_order(&uuid));
        assert!(stored(&records, &uuid).unwrap().contains(r#"[{"name":"B""#));
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let Fixture { records, mut store } = fixture();
        let (uuid, _) = store.create_palette("P");
        let (a, _) = store.add_color(&uuid, None).unwrap();
        let (b, _) = store.add_color(&uuid, None).unwrap();
        let before = stored(&records, &uuid);

        let short = store.commit_reorder(&uuid, &[a.as_str()]).unwrap_err();
        assert!(matches!(
            short,
            PaletteError::InvalidReorder {
                violation: ReorderViolation::LengthMismatch { expected: 2, actual: 1 },
                ..
            }
        ));

        let duplicate = store.commit_reorder(&uuid, &[a.as_str(), a.as_str()]).unwrap_err();
        assert!(matches!(
            duplicate,
            PaletteError::InvalidReorder {
                violation: ReorderViolation::Duplicate(_),
                ..
            }
        ));

        let unknown = store.reorder_colors(&uuid, &[a.as_str(), "zzz"]).unwrap_err();
        assert!(matches!(
            unknown,
            PaletteError::InvalidReorder {
                violation: ReorderViolation::Unknown(_),
                ..
            }
        ));

        let ids: Vec<_> = store.palette(&uuid).unwrap().colors.iter().map(|color| color.id.clone()).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(stored(&records, &uuid), before);
    }

    #[test]
    fn storage_failure_keeps_memory_change() {
        let Fixture { records, mut store } = fixture();
        let (uuid, _) = store.create_palette("P");
        records.set_unavailable(true);

        let (id, outcome) = store.add_color(&uuid, None).unwrap();
        assert!(matches!(outcome, WriteOutcome::NotPersisted { ref key, .. } if *key == palette_key(&uuid)));
        assert!(store.palette(&uuid).unwrap().contains_color(&id));

        let outcome = store.delete_palette(&uuid).unwrap();
        assert!(!outcome.is_persisted());
        assert!(store.palette(&uuid).is_none());
    }

    #[test]
    fn oversized_palette_is_kept_in_memory() {
        let Fixture { mut store, .. } = fixture();
        let (uuid, _) = store.create_palette("P");
        let long_name = "x".repeat(5000);
        let outcome = store.change_palette(&uuid, long_name.clone(), Vec::new()).unwrap();
        assert!(!outcome.is_persisted());
        assert_eq!(store.palette(&uuid).unwrap().name, long_name);
    }

    #[test]
    fn records_use_configured_expiry() {
        let records = Arc::new(InMemoryRecordStore::new());
        let mut store = PaletteStore::new(records.clone(), Arc::new(SequentialIdGenerator::new("id-"))).with_expiry_days(0);
        let (uuid, outcome) = store.create_palette("Ephemeral");
        assert!(outcome.is_persisted());
        assert!(records.get(&palette_key(&uuid)).unwrap().is_none());
    }
}
