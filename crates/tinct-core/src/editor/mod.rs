//! The editor controller.
//!
//! An [`Editor`] owns one [`Selection`], the palette working copies and the
//! bound views. Every input path (spin boxes, hex entry, plane, ring,
//! swatches, drops, the eyedropper and external settings changes) funnels
//! into the selection; each resulting change is pushed to every view exactly
//! once. Edits reported by views while that push is in progress are dropped.

mod channel;
mod view;

pub use channel::{
    Channel,
    ChannelRange,
    Edit,
    ViewValue,
    angle_to_hue,
    parse_number,
    plane_to_sv,
};
pub use view::{ColorView, NumericEntry, ViewId};

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crate::color::{Hsva, Rgba};
use crate::config::EditorConfig;
use crate::eyedropper::{
    Eyedropper,
    EyedropperError,
    EyedropperHost,
    EyedropperResult,
    PickOutcome,
};
use crate::input::{InputEvent, Key};
use crate::palette::{BUILTIN_PALETTE_SIZE, CUSTOM_PALETTE_CAPACITY, PaletteStore, format_palette};
use crate::selection::{Generation, Selection};
use crate::settings::{
    CUSTOM_COLORS_KEY,
    SELECTED_COLOR_KEY,
    SettingChange,
    SettingValue,
    SettingsBridge,
    SettingsStore,
    decode_custom_colors,
    decode_selected_color,
    encode_custom_colors,
    encode_selected_color,
};
use crate::swatch::{
    COLOR_DATA_LEN,
    DragDataError,
    Swatch,
    SwatchAction,
    SwatchMarker,
    SwatchRef,
    SwatchState,
    decode_color,
    encode_color,
    slot_color,
};

/// What the editor is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    /// Pushing a change to the bound views.
    Broadcasting,
    /// The eyedropper holds the input grabs.
    EyedropperActive,
}

/// Where a drag starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    /// The "old color" sample.
    Previous,
    /// The "new color" sample.
    Current,
    Slot(SwatchRef),
}

struct BoundView {
    id: ViewId,
    channel: Channel,
    view: Box<dyn ColorView>,
}

/// Single source of truth for one color editor.
pub struct Editor<S: SettingsStore> {
    config: EditorConfig,
    selection: Selection,
    palette: PaletteStore<S>,
    bridge: SettingsBridge<S>,
    marker: SwatchMarker,
    views: Vec<BoundView>,
    next_view_id: u64,
    changing: bool,
    eyedropper: Option<Eyedropper>,
    settings_rx: Receiver<SettingChange>,
    /// Changes received but not yet applied, with this editor's own writes removed.
    pending: VecDeque<SettingChange>,
}

impl<S: SettingsStore> Editor<S> {
    /// Create an editor with the default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, EditorConfig::default())
    }

    /// Create an editor, load the palettes and restore the selected color.
    pub fn with_config(store: Arc<S>, config: EditorConfig) -> Self {
        let bridge = SettingsBridge::new(store, config.palette_key.clone());
        let settings_rx = bridge.observe();
        let palette = PaletteStore::new(bridge.clone());

        let mut selection = Selection::new();
        let _ = selection.set_has_opacity(config.has_opacity);
        let _ = selection.set_has_palette(config.has_palette);

        let mut editor = Self {
            config,
            selection,
            palette,
            bridge,
            marker: SwatchMarker::new(),
            views: Vec::new(),
            next_view_id: 0,
            changing: false,
            eyedropper: None,
            settings_rx,
            pending: VecDeque::new(),
        };

        if editor.config.restore_selected_color {
            if let Some(rgba) = editor.bridge.selected_color() {
                log::debug!("Restoring selected color {:?}", rgba);
                let _ = editor.selection.set_current_rgba(rgba);
                editor.mark_matching(&rgba);
            }
        }

        editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> EditorState {
        if self.changing {
            EditorState::Broadcasting
        } else if self.is_picking() {
            EditorState::EyedropperActive
        } else {
            EditorState::Idle
        }
    }

    pub fn current_rgba(&self) -> Rgba {
        self.selection.current_rgba()
    }

    pub fn current_hsva(&self) -> Hsva {
        self.selection.current_hsva()
    }

    pub fn previous_rgba(&self) -> Rgba {
        self.selection.previous_rgba()
    }

    pub fn generation(&self) -> Generation {
        self.selection.generation()
    }

    // --- Views ---

    /// Bind a view to a channel. It immediately receives the current value.
    pub fn bind(&mut self, channel: Channel, mut view: Box<dyn ColorView>) -> ViewId {
        view.configure(channel, channel.range());

        self.next_view_id += 1;
        let id = ViewId(self.next_view_id);
        self.views.push(BoundView { id, channel, view });
        self.refresh(|bound| bound.id == id);
        id
    }

    /// Remove a bound view. Returns false if it was not bound.
    pub fn unbind(&mut self, id: ViewId) -> bool {
        let before = self.views.len();
        self.views.retain(|bound| bound.id != id);
        self.views.len() != before
    }

    /// A view reports a user edit.
    ///
    /// Returns true if the selection changed. Edits arriving while a change
    /// is being broadcast are dropped.
    pub fn notify_view_changed(&mut self, channel: Channel, value: ViewValue) -> bool {
        if self.changing {
            log::trace!("Dropping {:?} edit during broadcast", channel);
            return false;
        }

        let edit = channel.edit(&self.selection, &value);
        let changed = match edit {
            Edit::Rgb([r, g, b]) => self.apply(|s| s.set_current_rgb(r, g, b)),
            Edit::Hsv(hsv) => self.apply(|s| s.set_current_hsv(hsv)),
            Edit::Alpha(alpha) => {
                if !self.selection.has_opacity() {
                    log::debug!("Ignoring alpha edit with opacity disabled");
                    false
                } else {
                    self.apply(|s| s.set_current_alpha(alpha))
                }
            }
            Edit::Current(rgba) => self.apply(|s| s.set_current_rgba(rgba)),
            Edit::Previous(rgba) => {
                self.set_previous_rgba(rgba);
                return true;
            }
            Edit::InvalidText(_) | Edit::Rejected => false,
        };

        if !changed {
            // Snap the edited views back to the canonical value.
            self.refresh(|bound| bound.channel == channel);
        }
        changed
    }

    fn apply(&mut self, mutate: impl FnOnce(&mut Selection) -> Option<Generation>) -> bool {
        match mutate(&mut self.selection) {
            Some(generation) => {
                self.broadcast(generation);
                true
            }
            None => false,
        }
    }

    fn broadcast(&mut self, generation: Generation) {
        log::trace!("Broadcasting generation {}", generation);
        self.refresh(|_| true);
    }

    /// Push current values to the views selected by `filter` under the guard.
    fn refresh(&mut self, filter: impl Fn(&BoundView) -> bool) {
        let outer = std::mem::replace(&mut self.changing, true);

        for bound in self.views.iter_mut().filter(|bound| filter(bound)) {
            let value = bound.channel.value(&self.selection);
            if let Some(echo) = bound.view.update(&value) {
                log::trace!("Dropping {:?} echo {:?}", bound.channel, echo);
            }
        }

        self.changing = outer;
    }

    // --- Model ---

    /// Set the current color. Returns true if views were updated.
    pub fn set_current_rgba(&mut self, rgba: Rgba) -> bool {
        self.apply(|s| s.set_current_rgba(rgba))
    }

    /// Set the current color from HSV. Returns true if views were updated.
    pub fn set_current_hsva(&mut self, hsva: Hsva) -> bool {
        self.apply(|s| s.set_current_hsva(hsva))
    }

    /// Set the comparison color and refresh the old-color samples.
    pub fn set_previous_rgba(&mut self, rgba: Rgba) {
        self.selection.set_previous_rgba(rgba);
        self.refresh(|bound| bound.channel == Channel::SwatchOld);
    }

    pub fn set_has_opacity(&mut self, has_opacity: bool) -> bool {
        self.apply(|s| s.set_has_opacity(has_opacity))
    }

    pub fn set_has_palette(&mut self, has_palette: bool) -> bool {
        self.apply(|s| s.set_has_palette(has_palette))
    }

    // --- Palette ---

    pub fn builtin_palette(&self) -> &[Rgba] {
        self.palette.builtin()
    }

    pub fn custom_palette(&self) -> &[Rgba] {
        self.palette.custom()
    }

    /// Moves whenever either palette changes.
    pub fn palette_revision(&self) -> u64 {
        self.palette.revision()
    }

    pub fn selected_swatch(&self) -> Option<SwatchRef> {
        self.marker.selected()
    }

    pub fn swatch_state(&self, slot: SwatchRef) -> SwatchState {
        self.marker.state(slot)
    }

    pub fn focus_swatch(&mut self, slot: Option<SwatchRef>) {
        self.marker.set_focused(slot);
    }

    /// The swatch for a slot; `None` outside the palettes.
    pub fn swatch(&self, slot: SwatchRef) -> Option<Swatch> {
        match slot {
            SwatchRef::Builtin(i) if i < BUILTIN_PALETTE_SIZE => {
                Some(Swatch::new(slot, self.palette.builtin().get(i).copied(), false))
            }
            SwatchRef::Custom(i) if i < CUSTOM_PALETTE_CAPACITY => Some(Swatch::new(
                slot,
                self.palette.custom().get(i).copied(),
                self.selection.has_opacity(),
            )),
            _ => None,
        }
    }

    /// Every builtin swatch followed by the occupied custom swatches.
    pub fn swatches(&self) -> Vec<Swatch> {
        let builtin = (0..self.palette.builtin().len()).map(SwatchRef::Builtin);
        let custom = (0..self.palette.custom().len()).map(SwatchRef::Custom);
        builtin.chain(custom).filter_map(|slot| self.swatch(slot)).collect()
    }

    /// Click on a swatch: make its color current and mark it selected.
    pub fn activate_swatch(&mut self, slot: SwatchRef) -> bool {
        let Some(color) = slot_color(slot, self.palette.builtin(), self.palette.custom()) else {
            return false;
        };
        self.select_slot(slot, color);
        self.set_current_rgba(color);
        true
    }

    /// Key press on a focused swatch.
    pub fn swatch_key(&mut self, slot: SwatchRef, key: &Key) -> bool {
        match self.swatch(slot).and_then(|swatch| swatch.handle_key(key)) {
            Some(action) => self.swatch_action(slot, action),
            None => false,
        }
    }

    /// Run a swatch action, from a key or the context menu.
    pub fn swatch_action(&mut self, slot: SwatchRef, action: SwatchAction) -> bool {
        match action {
            SwatchAction::Activate => self.activate_swatch(slot),
            SwatchAction::SaveCurrent => self.save_current_to_slot(slot),
        }
    }

    /// Store the current color into a slot.
    pub fn save_current_to_slot(&mut self, slot: SwatchRef) -> bool {
        let current = self.selection.current_rgba();
        self.write_slot(slot, current)
    }

    fn write_slot(&mut self, slot: SwatchRef, rgba: Rgba) -> bool {
        let written = match slot {
            SwatchRef::Builtin(i) => {
                let saved = self.palette.save_slot(i, rgba);
                if saved {
                    self.absorb_palette_echo();
                }
                saved
            }
            SwatchRef::Custom(i) if i < self.palette.custom().len() => {
                let saved = self.palette.set_custom(i, rgba);
                if saved {
                    self.absorb_custom_echo();
                }
                saved
            }
            SwatchRef::Custom(i) if i < CUSTOM_PALETTE_CAPACITY => {
                self.palette.insert_custom(rgba);
                self.absorb_custom_echo();
                self.marker.shift_custom();
                true
            }
            SwatchRef::Custom(_) => false,
        };
        if written {
            self.marker.reconcile(self.palette.builtin(), self.palette.custom());
        }
        written
    }

    /// Select a color like a chooser: an equal swatch becomes selected,
    /// otherwise the color is added as a custom color.
    pub fn choose_rgba(&mut self, rgba: Rgba) {
        let use_alpha = self.selection.has_opacity();
        let matches = |c: &Rgba| {
            if use_alpha { c.eq_u16(&rgba) } else { c.eq_rgb_u16(&rgba) }
        };

        let found = self
            .palette
            .builtin()
            .iter()
            .position(matches)
            .map(SwatchRef::Builtin)
            .or_else(|| self.palette.custom().iter().position(matches).map(SwatchRef::Custom));

        match found {
            Some(slot) => {
                if let Some(color) =
                    slot_color(slot, self.palette.builtin(), self.palette.custom())
                {
                    self.select_slot(slot, color);
                }
                self.set_current_rgba(rgba);
            }
            None => self.add_custom(rgba),
        }
    }

    /// Add a color to the front of the custom palette and select it.
    pub fn add_custom(&mut self, rgba: Rgba) {
        self.palette.insert_custom(rgba);
        self.absorb_custom_echo();
        self.marker.shift_custom();
        if let Some(color) = self.palette.custom().first().copied() {
            self.select_slot(SwatchRef::Custom(0), color);
        }
        self.set_current_rgba(rgba);
    }

    fn select_slot(&mut self, slot: SwatchRef, color: Rgba) {
        if !self.marker.select(slot, color) {
            return;
        }
        if let Err(e) = self.bridge.set_selected_color(&color) {
            log::warn!("Failed to save selected color: {}", e);
        }
        self.absorb_echo(SELECTED_COLOR_KEY, &encode_selected_color(&color));
    }

    fn mark_matching(&mut self, rgba: &Rgba) {
        let builtin = self.palette.builtin();
        let custom = self.palette.custom();
        let found = builtin
            .iter()
            .position(|c| c.eq_u16(rgba))
            .map(SwatchRef::Builtin)
            .or_else(|| custom.iter().position(|c| c.eq_u16(rgba)).map(SwatchRef::Custom));
        match found {
            Some(slot) => {
                self.marker.select(slot, *rgba);
            }
            None => self.marker.clear(),
        }
    }

    // --- Drag and drop ---

    /// Drop onto the new-color sample.
    pub fn drop_on_current(&mut self, data: &[u8], format: u8) -> Result<(), DragDataError> {
        let rgba = decode_color(data, format)?;
        self.set_current_rgba(rgba);
        Ok(())
    }

    /// Drop onto a palette slot: store it there, then make it current.
    pub fn drop_on_slot(
        &mut self,
        slot: SwatchRef,
        data: &[u8],
        format: u8,
    ) -> Result<(), DragDataError> {
        let rgba = decode_color(data, format)?;
        self.write_slot(slot, rgba);
        self.set_current_rgba(rgba);
        Ok(())
    }

    /// The drag payload offered by a source.
    pub fn drag_data(&self, source: DragSource) -> Option<[u8; COLOR_DATA_LEN]> {
        let use_alpha = self.selection.has_opacity();
        match source {
            DragSource::Previous => Some(encode_color(&self.selection.previous_rgba(), use_alpha)),
            DragSource::Current => Some(encode_color(&self.selection.current_rgba(), use_alpha)),
            DragSource::Slot(slot) => self.swatch(slot).and_then(|swatch| swatch.drag_data()),
        }
    }

    // --- Settings ---

    /// Apply pending external settings changes. Returns how many were applied.
    pub fn poll_settings(&mut self) -> usize {
        if self.changing {
            return 0;
        }
        self.pending.extend(self.settings_rx.try_iter());
        let changes: Vec<SettingChange> = self.pending.drain(..).collect();
        changes
            .into_iter()
            .filter(|change| self.apply_setting_change(change))
            .count()
    }

    /// Queue everything received so far and remove the notification of the
    /// write this editor just made. Stores notify observers before `set`
    /// returns, so that notification is the newest one for `key`.
    fn absorb_echo(&mut self, key: &str, written: &SettingValue) {
        self.pending.extend(self.settings_rx.try_iter());
        let echo = self
            .pending
            .iter()
            .rposition(|change| change.key == key && change.value.as_ref() == Some(written));
        if let Some(index) = echo {
            self.pending.remove(index);
        }
    }

    fn absorb_custom_echo(&mut self) {
        let written = encode_custom_colors(self.palette.custom());
        self.absorb_echo(CUSTOM_COLORS_KEY, &written);
    }

    fn absorb_palette_echo(&mut self) {
        let key = self.bridge.palette_key().to_string();
        let written = SettingValue::Text(format_palette(self.palette.builtin()));
        self.absorb_echo(&key, &written);
    }

    fn apply_setting_change(&mut self, change: &SettingChange) -> bool {
        match change.key.as_str() {
            SELECTED_COLOR_KEY => {
                let Some(rgba) = change.value.as_ref().and_then(decode_selected_color) else {
                    return false;
                };
                log::debug!("Selected color changed externally");
                self.mark_matching(&rgba);
                self.set_current_rgba(rgba);
                true
            }
            CUSTOM_COLORS_KEY => {
                let colors = match change.value.as_ref().map(decode_custom_colors) {
                    Some(Ok(colors)) => colors,
                    Some(Err(e)) => {
                        log::debug!("Ignoring external custom colors: {}", e);
                        return false;
                    }
                    None => Vec::new(),
                };
                self.palette_changed(|palette| palette.apply_custom(colors))
            }
            key if key == self.bridge.palette_key() => {
                let stored = change.value.as_ref().and_then(|v| v.as_str()).map(str::to_string);
                self.palette_changed(|palette| palette.apply_palette_string(stored.as_deref()))
            }
            other => {
                log::trace!("Ignoring change to {}", other);
                false
            }
        }
    }

    fn palette_changed(&mut self, update: impl FnOnce(&mut PaletteStore<S>) -> bool) -> bool {
        if !update(&mut self.palette) {
            return false;
        }
        log::debug!("Palette changed externally");
        self.marker.reconcile(self.palette.builtin(), self.palette.custom());
        true
    }

    // --- Eyedropper ---

    /// Provide the window-system capabilities for picking.
    pub fn set_eyedropper_host(&mut self, host: Box<dyn EyedropperHost>) {
        self.cancel_pick();
        self.eyedropper = Some(Eyedropper::new(host).with_big_step(self.config.big_step));
    }

    pub fn is_picking(&self) -> bool {
        self.eyedropper.as_ref().is_some_and(Eyedropper::is_active)
    }

    /// Enter pick mode. On failure the editor stays idle.
    pub fn begin_pick(&mut self) -> EyedropperResult<()> {
        let Some(eyedropper) = self.eyedropper.as_mut() else {
            log::debug!("No eyedropper host");
            return Err(EyedropperError::ScreenCaptureUnavailable);
        };
        eyedropper.begin()
    }

    /// Feed a grabbed input event to the eyedropper.
    pub fn handle_pick_event(&mut self, event: &InputEvent) -> PickOutcome {
        let Some(eyedropper) = self.eyedropper.as_mut() else {
            return PickOutcome::Ignored;
        };
        let outcome = eyedropper.handle_event(event);
        if let PickOutcome::Preview(rgba) | PickOutcome::Committed(rgba) = &outcome {
            self.notify_view_changed(Channel::SwatchNew, ViewValue::Color(*rgba));
        }
        outcome
    }

    /// Leave pick mode without sampling. Safe to call when not picking.
    pub fn cancel_pick(&mut self) {
        if let Some(eyedropper) = self.eyedropper.as_mut() {
            eyedropper.cancel();
        }
    }
}

impl<S: SettingsStore> Drop for Editor<S> {
    fn drop(&mut self) {
        self.cancel_pick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eyedropper::GrabDevice;
    use crate::eyedropper::tests::FakeHost;
    use crate::input::{Modifiers, MouseButton};
    use crate::settings::{
        MemorySettings,
        SettingValue,
        SettingsError,
        SettingsResult,
        encode_selected_color,
    };
    use kurbo::{Point, Size};
    use std::cell::RefCell;
    use std::f64::consts::PI;
    use std::rc::Rc;
    use std::sync::mpsc::Sender;

    type Seen = Rc<RefCell<Vec<ViewValue>>>;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn editor() -> Editor<MemorySettings> {
        init();
        Editor::new(Arc::new(MemorySettings::new()))
    }

    fn editor_with(store: &Arc<MemorySettings>, config: EditorConfig) -> Editor<MemorySettings> {
        init();
        Editor::with_config(Arc::clone(store), config)
    }

    fn recorder() -> (Box<dyn ColorView>, Seen) {
        let seen: Seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let view: Box<dyn ColorView> = Box::new(move |value: &ViewValue| -> Option<ViewValue> {
            sink.borrow_mut().push(value.clone());
            None
        });
        (view, seen)
    }

    fn last(seen: &Seen) -> ViewValue {
        seen.borrow().last().cloned().unwrap()
    }

    fn red() -> Rgba {
        Rgba::new(1.0, 0.0, 0.0, 1.0)
    }

    struct FailingSettings;

    impl SettingsStore for FailingSettings {
        fn get(&self, _key: &str) -> SettingsResult<Option<SettingValue>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: SettingValue) -> SettingsResult<()> {
            Err(SettingsError::PersistenceFailed("disk full".into()))
        }

        fn reset(&self, _key: &str) -> SettingsResult<()> {
            Ok(())
        }

        fn observe(&self, _key: &str, _sender: Sender<SettingChange>) {}
    }

    #[test]
    fn test_first_set_initialises_previous() {
        let mut e = editor();
        assert!(e.set_current_rgba(red()));
        assert_eq!(e.previous_rgba(), red());
        assert_eq!(e.current_hsva(), Hsva::new(0.0, 1.0, 1.0, 1.0));
        assert_eq!(e.state(), EditorState::Idle);
    }

    #[test]
    fn test_bind_pushes_current_value() {
        let mut e = editor();
        let (view, seen) = recorder();
        e.bind(Channel::Red, view);
        assert_eq!(*seen.borrow(), vec![ViewValue::Number(255.0)]);

        e.set_current_rgba(Rgba::BLACK);
        assert_eq!(last(&seen), ViewValue::Number(0.0));
    }

    #[test]
    fn test_broadcast_reaches_every_channel_once() {
        let mut e = editor();
        let recorders: Vec<Seen> = Channel::ALL
            .iter()
            .map(|channel| {
                let (view, seen) = recorder();
                e.bind(*channel, view);
                seen
            })
            .collect();

        e.set_current_rgba(red());
        for seen in &recorders {
            assert_eq!(seen.borrow().len(), 2);
        }
        assert_eq!(last(&recorders[7]), ViewValue::Text("#FF0000".into()));
    }

    #[test]
    fn test_echoing_view_does_not_rebroadcast() {
        let mut e = editor();
        e.bind(Channel::Red, Box::new(|value: &ViewValue| Some(value.clone())));
        let (hex, seen) = recorder();
        e.bind(Channel::Hex, hex);

        let generation = e.generation();
        e.set_current_rgba(Rgba::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(e.generation(), generation + 1);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_edit_reported_during_broadcast_is_dropped() {
        let mut e = editor();
        e.bind(Channel::Red, Box::new(|_: &ViewValue| Some(ViewValue::Number(10.0))));

        e.set_current_rgba(Rgba::BLACK);
        assert_eq!(e.current_rgba(), Rgba::BLACK);
    }

    #[test]
    fn test_spin_edit_broadcasts() {
        let mut e = editor();
        let (hex, seen) = recorder();
        e.bind(Channel::Hex, hex);

        assert!(e.notify_view_changed(Channel::Red, ViewValue::Number(0.0)));
        assert_eq!(e.current_rgba(), Rgba::new(0.0, 1.0, 1.0, 1.0));
        assert_eq!(last(&seen), ViewValue::Text("#00FFFF".into()));
    }

    #[test]
    fn test_hue_spin_wraps() {
        let mut e = editor();
        e.set_current_rgba(red());
        e.notify_view_changed(Channel::Hue, ViewValue::Number(480.0));
        assert_eq!(e.current_rgba().to_rgb8(), [0, 255, 0]);
    }

    #[test]
    fn test_invalid_hex_restores_entry() {
        let mut e = editor();
        e.set_current_rgba(red());
        let (hex, seen) = recorder();
        e.bind(Channel::Hex, hex);

        let generation = e.generation();
        assert!(!e.notify_view_changed(Channel::Hex, ViewValue::Text("zzz".into())));
        assert_eq!(e.generation(), generation);
        assert_eq!(last(&seen), ViewValue::Text("#FF0000".into()));
    }

    #[test]
    fn test_hex_entry_accepts_names() {
        let mut e = editor();
        assert!(e.notify_view_changed(Channel::Hex, ViewValue::Text("dodger blue".into())));
        assert_eq!(e.current_rgba().to_rgb8(), [0x1E, 0x90, 0xFF]);
    }

    #[test]
    fn test_plane_edit_keeps_hue() {
        let mut e = editor();
        e.set_current_rgba(red());
        let point = ViewValue::PlanePoint {
            position: Point::new(50.0, 50.0),
            size: Size::new(100.0, 100.0),
        };
        assert!(e.notify_view_changed(Channel::HsvPlane, point));
        assert_eq!(e.current_rgba(), Rgba::new(0.5, 0.25, 0.25, 1.0));
    }

    #[test]
    fn test_ring_edit_keeps_saturation_and_value() {
        let mut e = editor();
        e.set_current_hsva(Hsva::new(0.0, 0.5, 0.8, 1.0));
        e.notify_view_changed(Channel::HueRing, ViewValue::Angle(PI));
        let hsva = e.current_hsva();
        assert_eq!((hsva.hue, hsva.saturation, hsva.value), (0.5, 0.5, 0.8));
    }

    #[test]
    fn test_alpha_hidden_without_opacity() {
        let store = Arc::new(MemorySettings::new());
        let config = EditorConfig { has_opacity: false, ..Default::default() };
        let mut e = editor_with(&store, config);

        e.set_current_rgba(Rgba::new(0.0, 0.0, 0.0, 0.2));
        assert_eq!(e.current_rgba().alpha, 1.0);
        assert_eq!(e.current_hsva().alpha, 1.0);
        assert!(!e.notify_view_changed(Channel::Alpha, ViewValue::Number(10.0)));
    }

    #[test]
    fn test_alpha_spin() {
        let mut e = editor();
        assert!(e.notify_view_changed(Channel::Alpha, ViewValue::Number(51.0)));
        assert_eq!(e.current_rgba().alpha, 0.2);
    }

    #[test]
    fn test_toggling_opacity_refreshes_alpha_views() {
        let mut e = editor();
        let (alpha, seen) = recorder();
        e.bind(Channel::Alpha, alpha);

        e.set_current_rgba(Rgba::new(0.0, 0.0, 0.0, 0.2));
        assert!(e.set_has_opacity(false));
        assert_eq!(
            *seen.borrow(),
            vec![ViewValue::Number(255.0), ViewValue::Number(51.0), ViewValue::Number(255.0)]
        );
    }

    #[test]
    fn test_old_sample_edit_sets_previous_only() {
        let mut e = editor();
        e.set_current_rgba(red());
        let (old, seen) = recorder();
        e.bind(Channel::SwatchOld, old);

        let generation = e.generation();
        assert!(e.notify_view_changed(Channel::SwatchOld, ViewValue::Color(Rgba::BLACK)));
        assert_eq!(e.previous_rgba(), Rgba::BLACK);
        assert_eq!(e.current_rgba(), red());
        assert_eq!(e.generation(), generation);
        assert_eq!(last(&seen), ViewValue::Color(Rgba::BLACK));
    }

    #[test]
    fn test_unbind_stops_updates() {
        let mut e = editor();
        let (view, seen) = recorder();
        let id = e.bind(Channel::Green, view);
        assert!(e.unbind(id));
        assert!(!e.unbind(id));

        e.set_current_rgba(Rgba::BLACK);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_activate_swatch_writes_selected_color() {
        let store = Arc::new(MemorySettings::new());
        let mut e = editor_with(&store, EditorConfig::default());

        assert!(e.activate_swatch(SwatchRef::Builtin(3)));
        assert_eq!(e.current_rgba(), red());
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Builtin(3)));
        assert!(e.swatch_state(SwatchRef::Builtin(3)).selected);

        let bridge = SettingsBridge::new(Arc::clone(&store), "ctk-color-palette");
        assert_eq!(bridge.selected_color(), Some(red()));
    }

    #[test]
    fn test_swatch_keys() {
        let mut e = editor();
        assert!(e.swatch_key(SwatchRef::Builtin(0), &Key::Space));
        assert_eq!(e.current_rgba(), Rgba::BLACK);
        assert!(!e.swatch_key(SwatchRef::Builtin(1), &Key::Escape));
        assert!(!e.swatch_key(SwatchRef::Custom(0), &Key::Enter));
    }

    #[test]
    fn test_save_current_to_builtin_slot() {
        let store = Arc::new(MemorySettings::new());
        let mut e = editor_with(&store, EditorConfig::default());
        e.set_current_rgba(Rgba::new(0.2, 0.4, 0.6, 1.0));

        let revision = e.palette_revision();
        assert!(e.swatch_action(SwatchRef::Builtin(5), SwatchAction::SaveCurrent));
        assert_eq!(e.builtin_palette()[5].to_rgb8(), [51, 102, 153]);
        assert!(e.palette_revision() > revision);

        let stored = store.get("ctk-color-palette").unwrap().unwrap();
        let stored = stored.as_str().unwrap();
        assert_eq!(stored.split(':').count(), 20);
        assert_eq!(stored.split(':').nth(5), Some("#336699"));
    }

    #[test]
    fn test_choose_existing_color_selects_swatch() {
        let mut e = editor();
        e.choose_rgba(Rgba::WHITE);
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Builtin(1)));
        assert!(e.custom_palette().is_empty());
    }

    #[test]
    fn test_choose_new_color_adds_custom() {
        let mut e = editor();
        let first = Rgba::new(0.1, 0.2, 0.3, 1.0);
        let second = Rgba::new(0.3, 0.2, 0.1, 1.0);

        e.choose_rgba(first);
        assert_eq!(e.custom_palette(), &[first]);
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Custom(0)));
        assert_eq!(e.current_rgba(), first);

        e.choose_rgba(second);
        assert_eq!(e.custom_palette(), &[second, first]);
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Custom(0)));

        e.choose_rgba(first);
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Custom(1)));
        assert_eq!(e.custom_palette().len(), 2);
    }

    #[test]
    fn test_choose_ignores_alpha_without_opacity() {
        let store = Arc::new(MemorySettings::new());
        let config = EditorConfig { has_opacity: false, ..Default::default() };
        let mut e = editor_with(&store, config);

        e.choose_rgba(Rgba::WHITE.with_alpha(0.5));
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Builtin(1)));
        assert!(e.custom_palette().is_empty());
    }

    #[test]
    fn test_custom_palette_is_bounded() {
        let mut e = editor();
        let colors: Vec<Rgba> = (0..10).map(|i| Rgba::from_rgb8(10 + i * 10, 7, 7)).collect();
        for c in &colors {
            e.add_custom(*c);
        }
        let expected: Vec<Rgba> = colors[1..].iter().rev().copied().collect();
        assert_eq!(e.custom_palette(), expected.as_slice());
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Custom(0)));
    }

    #[test]
    fn test_drop_on_current() {
        let mut e = editor();
        e.drop_on_current(&[0, 0, 0xFF, 0xFF, 0, 0, 0xFF, 0xFF], 16).unwrap();
        assert_eq!(e.current_rgba(), Rgba::new(0.0, 1.0, 0.0, 1.0));

        assert_eq!(
            e.drop_on_current(&[0xFF; 6], 16),
            Err(DragDataError::InvalidLength(6))
        );
        assert_eq!(e.current_rgba(), Rgba::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_drop_on_slot_stores_and_applies() {
        let mut e = editor();
        let red_data = [0xFF, 0xFF, 0, 0, 0, 0, 0xFF, 0xFF];

        e.drop_on_slot(SwatchRef::Custom(0), &red_data, 16).unwrap();
        assert_eq!(e.custom_palette(), &[red()]);
        assert_eq!(e.current_rgba(), red());

        let green_data = [0, 0, 0xFF, 0xFF, 0, 0, 0xFF, 0xFF];
        e.drop_on_slot(SwatchRef::Builtin(2), &green_data, 16).unwrap();
        assert_eq!(e.builtin_palette()[2].to_rgb8(), [0, 255, 0]);

        assert!(e.drop_on_slot(SwatchRef::Builtin(2), &[0; 9], 16).is_err());
    }

    #[test]
    fn test_drag_data_without_opacity() {
        let store = Arc::new(MemorySettings::new());
        let config = EditorConfig { has_opacity: false, ..Default::default() };
        let mut e = editor_with(&store, config);
        e.set_current_rgba(Rgba::new(1.0, 0.0, 0.0, 0.2));

        assert_eq!(
            e.drag_data(DragSource::Current),
            Some([0xFF, 0xFF, 0, 0, 0, 0, 0xFF, 0xFF])
        );
        assert_eq!(
            e.drag_data(DragSource::Slot(SwatchRef::Builtin(0))),
            Some([0, 0, 0, 0, 0, 0, 0xFF, 0xFF])
        );
        assert_eq!(e.drag_data(DragSource::Slot(SwatchRef::Custom(0))), None);
        assert!(e.drag_data(DragSource::Previous).is_some());
    }

    #[test]
    fn test_external_selected_color_is_applied() {
        let store = Arc::new(MemorySettings::new());
        let mut e = editor_with(&store, EditorConfig::default());
        let (hex, seen) = recorder();
        e.bind(Channel::Hex, hex);

        let blue = Rgba::new(0.0, 0.0, 1.0, 1.0);
        store.set(SELECTED_COLOR_KEY, encode_selected_color(&blue)).unwrap();
        assert_eq!(e.poll_settings(), 1);
        assert_eq!(e.current_rgba(), blue);
        assert_eq!(last(&seen), ViewValue::Text("#0000FF".into()));
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Builtin(5)));
    }

    #[test]
    fn test_own_selected_color_echo_is_ignored() {
        let mut e = editor();
        e.activate_swatch(SwatchRef::Builtin(3));
        e.notify_view_changed(Channel::Green, ViewValue::Number(255.0));

        assert_eq!(e.poll_settings(), 0);
        assert_eq!(e.current_rgba(), Rgba::new(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_external_custom_colors_move_marker() {
        let store = Arc::new(MemorySettings::new());
        let mut e = editor_with(&store, EditorConfig::default());
        let mine = Rgba::new(0.1, 0.2, 0.3, 1.0);
        let theirs = Rgba::new(0.9, 0.9, 0.1, 1.0);
        e.add_custom(mine);

        let other = SettingsBridge::new(Arc::clone(&store), "ctk-color-palette");
        other.set_custom_colors(&[theirs, mine]).unwrap();

        assert_eq!(e.poll_settings(), 1);
        assert_eq!(e.custom_palette(), &[theirs, mine]);
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Custom(1)));
    }

    #[test]
    fn test_external_palette_string() {
        let store = Arc::new(MemorySettings::new());
        let mut e = editor_with(&store, EditorConfig::default());
        let revision = e.palette_revision();

        store
            .set("ctk-color-palette", SettingValue::Text("#123456".into()))
            .unwrap();
        assert_eq!(e.poll_settings(), 1);
        assert_eq!(e.builtin_palette().len(), 20);
        assert_eq!(e.builtin_palette()[0].to_rgb8(), [0x12, 0x34, 0x56]);
        assert!(e.palette_revision() > revision);
    }

    #[test]
    fn test_consecutive_selections_survive_poll() {
        let mut e = editor();
        e.activate_swatch(SwatchRef::Builtin(3));
        e.activate_swatch(SwatchRef::Builtin(5));

        assert_eq!(e.poll_settings(), 0);
        assert_eq!(e.current_rgba(), Rgba::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Builtin(5)));
    }

    #[test]
    fn test_external_write_of_previously_written_color_applies() {
        let store = Arc::new(MemorySettings::new());
        let mut e = editor_with(&store, EditorConfig::default());
        e.activate_swatch(SwatchRef::Builtin(3));
        assert_eq!(e.poll_settings(), 0);
        e.notify_view_changed(Channel::Green, ViewValue::Number(255.0));

        store.set(SELECTED_COLOR_KEY, encode_selected_color(&red())).unwrap();
        assert_eq!(e.poll_settings(), 1);
        assert_eq!(e.current_rgba(), red());
    }

    #[test]
    fn test_consecutive_custom_adds_survive_poll() {
        let mut e = editor();
        let a = Rgba::new(0.1, 0.2, 0.3, 1.0);
        let b = Rgba::new(0.7, 0.6, 0.5, 1.0);
        e.add_custom(a);
        e.add_custom(b);
        let revision = e.palette_revision();

        assert_eq!(e.poll_settings(), 0);
        assert_eq!(e.custom_palette(), &[b, a]);
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Custom(0)));
        assert_eq!(e.current_rgba(), b);
        assert_eq!(e.palette_revision(), revision);
    }

    #[test]
    fn test_slot_saves_are_not_replayed() {
        let mut e = editor();
        e.set_current_rgba(Rgba::new(0.2, 0.4, 0.6, 1.0));
        e.save_current_to_slot(SwatchRef::Builtin(4));
        e.save_current_to_slot(SwatchRef::Custom(0));
        e.set_current_rgba(Rgba::BLACK);
        e.save_current_to_slot(SwatchRef::Builtin(6));
        e.save_current_to_slot(SwatchRef::Custom(0));
        let revision = e.palette_revision();

        assert_eq!(e.poll_settings(), 0);
        assert_eq!(e.builtin_palette()[4].to_rgb8(), [51, 102, 153]);
        assert_eq!(e.builtin_palette()[6], Rgba::BLACK);
        assert_eq!(e.custom_palette(), &[Rgba::BLACK]);
        assert_eq!(e.palette_revision(), revision);
    }

    #[test]
    fn test_external_change_before_own_write_is_kept() {
        let store = Arc::new(MemorySettings::new());
        let mut e = editor_with(&store, EditorConfig::default());
        let other = SettingsBridge::new(Arc::clone(&store), "ctk-color-palette");
        let theirs = Rgba::new(0.9, 0.9, 0.1, 1.0);

        other.set_selected_color(&theirs).unwrap();
        e.activate_swatch(SwatchRef::Builtin(3));

        assert_eq!(e.poll_settings(), 1);
        assert_eq!(e.current_rgba(), theirs);
    }

    #[test]
    fn test_restore_selected_color_at_startup() {
        let store = Arc::new(MemorySettings::new());
        store.set(SELECTED_COLOR_KEY, encode_selected_color(&red())).unwrap();

        let e = editor_with(&store, EditorConfig::default());
        assert_eq!(e.current_rgba(), red());
        assert_eq!(e.previous_rgba(), red());
        assert_eq!(e.selected_swatch(), Some(SwatchRef::Builtin(3)));

        let config = EditorConfig { restore_selected_color: false, ..Default::default() };
        let e = editor_with(&store, config);
        assert_eq!(e.current_rgba(), Rgba::WHITE);
    }

    #[test]
    fn test_unparseable_stored_palette_uses_defaults() {
        let store = Arc::new(MemorySettings::new());
        store
            .set("ctk-color-palette", SettingValue::Text("red:#00ff00:rgb-not-a-color:blue".into()))
            .unwrap();
        let e = editor_with(&store, EditorConfig::default());
        assert_eq!(e.builtin_palette(), crate::palette::default_builtin().as_slice());
    }

    #[test]
    fn test_persistence_failure_keeps_working_copy() {
        init();
        let mut e = Editor::new(Arc::new(FailingSettings));
        e.add_custom(red());
        e.save_current_to_slot(SwatchRef::Builtin(0));

        assert_eq!(e.custom_palette(), &[red()]);
        assert_eq!(e.builtin_palette()[0], red());
        assert_eq!(e.current_rgba(), red());
    }

    #[test]
    fn test_eyedropper_preview_and_commit() {
        let mut e = editor();
        let (host, log) = FakeHost::new();
        log.borrow_mut().pixel = [0, 255, 0];
        e.set_eyedropper_host(Box::new(host));
        let (new, seen) = recorder();
        e.bind(Channel::SwatchNew, new);

        e.begin_pick().unwrap();
        assert_eq!(e.state(), EditorState::EyedropperActive);

        let moved = e.handle_pick_event(&InputEvent::PointerMove { position: Point::new(1.0, 1.0) });
        assert_eq!(moved, PickOutcome::Preview(Rgba::from_rgb8(0, 255, 0)));
        assert_eq!(e.current_rgba(), Rgba::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(last(&seen), ViewValue::Color(Rgba::new(0.0, 1.0, 0.0, 1.0)));

        log.borrow_mut().pixel = [0, 0, 255];
        let click = InputEvent::PointerDown { position: Point::ZERO, button: MouseButton::Left };
        assert!(matches!(e.handle_pick_event(&click), PickOutcome::Committed(_)));
        assert_eq!(e.current_rgba(), Rgba::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(e.state(), EditorState::Idle);
        assert!(log.borrow().held.is_empty());
    }

    #[test]
    fn test_eyedropper_arrow_and_escape() {
        let mut e = editor();
        let (host, log) = FakeHost::new();
        e.set_eyedropper_host(Box::new(host));
        e.begin_pick().unwrap();

        let nudge = InputEvent::KeyDown {
            key: Key::Right,
            modifiers: Modifiers { alt: true, ..Default::default() },
        };
        assert_eq!(e.handle_pick_event(&nudge), PickOutcome::Moved(Point::new(20.0, 0.0)));

        let escape = InputEvent::KeyDown { key: Key::Escape, modifiers: Modifiers::default() };
        assert_eq!(e.handle_pick_event(&escape), PickOutcome::Cancelled);
        assert_eq!(e.current_rgba(), Rgba::WHITE);
        assert!(log.borrow().held.is_empty());
    }

    #[test]
    fn test_eyedropper_grab_failure_stays_idle() {
        let mut e = editor();
        let (host, log) = FakeHost::new();
        log.borrow_mut().refuse = Some(GrabDevice::Keyboard);
        e.set_eyedropper_host(Box::new(host));

        assert_eq!(e.begin_pick(), Err(EyedropperError::GrabFailed(GrabDevice::Keyboard)));
        assert_eq!(e.state(), EditorState::Idle);
    }

    #[test]
    fn test_eyedropper_is_exclusive() {
        let mut e = editor();
        let (host, _log) = FakeHost::new();
        e.set_eyedropper_host(Box::new(host));
        e.begin_pick().unwrap();
        assert_eq!(e.begin_pick(), Err(EyedropperError::AlreadyActive));
        assert_eq!(e.state(), EditorState::EyedropperActive);
    }

    #[test]
    fn test_pick_without_host() {
        let mut e = editor();
        assert_eq!(e.begin_pick(), Err(EyedropperError::ScreenCaptureUnavailable));
        assert_eq!(e.handle_pick_event(&InputEvent::GrabBroken), PickOutcome::Ignored);
    }

    #[test]
    fn test_capture_failure_leaves_color() {
        let mut e = editor();
        e.set_current_rgba(red());
        let (host, log) = FakeHost::new();
        log.borrow_mut().capture_fails = true;
        e.set_eyedropper_host(Box::new(host));
        e.begin_pick().unwrap();

        let outcome = e.handle_pick_event(&InputEvent::PointerMove { position: Point::ZERO });
        assert_eq!(outcome, PickOutcome::Aborted(EyedropperError::ScreenCaptureUnavailable));
        assert_eq!(e.current_rgba(), red());
        assert_eq!(e.state(), EditorState::Idle);
    }

    #[test]
    fn test_dropping_editor_cancels_pick() {
        let mut e = editor();
        let (host, log) = FakeHost::new();
        e.set_eyedropper_host(Box::new(host));
        e.begin_pick().unwrap();
        assert_eq!(log.borrow().held.len(), 2);

        drop(e);
        assert!(log.borrow().held.is_empty());
    }
}
