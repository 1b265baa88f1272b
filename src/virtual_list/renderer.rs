//! Virtualized list renderer
//!
//! Keeps only the rows inside the current scroll window materialized. The host
//! UI layer owns the actual elements behind an [`ElementHost`]; this module does
//! the window math, diffing and scheduling.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use tracing::debug;

use super::layout::{ItemHeight, ListLayout};
use crate::config::VirtualListConfig;

/// Capabilities the host UI layer provides to the renderer
pub trait ElementHost<T> {
    /// Opaque element handle owned by the renderer while the row is visible
    type Handle;

    /// Build the element for `item`; `None` leaves a gap at that index
    fn create_element(&mut self, item: &T, index: usize) -> Option<Self::Handle>;

    /// Place the element at its absolute top offset
    fn position_element(&mut self, handle: &mut Self::Handle, offset: f64);

    fn destroy_element(&mut self, handle: Self::Handle);

    /// Size the spacer so the scrollbar reflects the full logical list
    fn set_content_height(&mut self, height: f64);

    fn remove_content_sizer(&mut self) {}

    fn detach_scroll_listener(&mut self) {}

    /// Ask for `on_animation_frame` at the next paint opportunity
    fn request_frame(&mut self) {}
}

/// Lifecycle of a list; destruction consumes the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// Constructed, nothing painted yet
    Idle,
    /// Items painted for the current window
    Rendered,
}

/// Construction options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualListOptions {
    pub viewport_height: f64,
    pub buffer: usize,
}

impl Default for VirtualListOptions {
    fn default() -> Self {
        Self {
            viewport_height: 0.0,
            buffer: VirtualListConfig::default().buffer,
        }
    }
}

impl VirtualListOptions {
    pub fn from_config(config: &VirtualListConfig, viewport_height: f64) -> Self {
        Self {
            viewport_height,
            buffer: config.buffer,
        }
    }
}

pub struct VirtualList<T, H: ElementHost<T>> {
    items: Vec<T>,
    item_height: ItemHeight,
    layout: ListLayout,
    buffer: usize,
    scroll_top: f64,
    viewport_height: f64,
    rendered: BTreeMap<usize, H::Handle>,
    window: Option<RangeInclusive<usize>>,
    frame_pending: bool,
    state: ListState,
    host: H,
}

impl<T, H: ElementHost<T>> VirtualList<T, H> {
    pub fn new(host: H, items: Vec<T>, item_height: ItemHeight, options: VirtualListOptions) -> Self {
        let layout = ListLayout::new(&item_height, items.len());
        Self {
            items,
            item_height,
            layout,
            buffer: options.buffer,
            scroll_top: 0.0,
            viewport_height: options.viewport_height,
            rendered: BTreeMap::new(),
            window: None,
            frame_pending: false,
            state: ListState::Idle,
            host,
        }
    }

    /// Paint the current window
    ///
    /// Elements that left the window are destroyed before any new element is
    /// created, so an index never has two live elements.
    pub fn render(&mut self) {
        self.host.set_content_height(self.layout.total_height());

        let window = self
            .layout
            .window(self.scroll_top, self.viewport_height, self.buffer);

        let stale: Vec<usize> = self
            .rendered
            .keys()
            .copied()
            .filter(|index| !window.as_ref().is_some_and(|w| w.contains(index)))
            .collect();
        for index in &stale {
            if let Some(handle) = self.rendered.remove(index) {
                self.host.destroy_element(handle);
            }
        }

        let mut created = 0usize;
        let mut skipped = 0usize;
        if let Some(range) = window.clone() {
            for index in range {
                if self.rendered.contains_key(&index) {
                    continue;
                }
                let Some(mut handle) = self.host.create_element(&self.items[index], index) else {
                    skipped += 1;
                    continue;
                };
                self.host
                    .position_element(&mut handle, self.layout.offset(index));
                self.rendered.insert(index, handle);
                created += 1;
            }
        }

        debug!(
            "Rendered window {:?}: {} removed, {} created, {} skipped",
            window,
            stale.len(),
            created,
            skipped
        );

        self.window = window;
        self.state = ListState::Rendered;
    }

    /// Record a scroll position; returns true when a frame was newly requested
    pub fn on_scroll(&mut self, scroll_top: f64) -> bool {
        self.scroll_top = scroll_top;
        self.schedule_frame()
    }

    /// Record a viewport resize; returns true when a frame was newly requested
    pub fn on_resize(&mut self, viewport_height: f64) -> bool {
        self.viewport_height = viewport_height;
        self.schedule_frame()
    }

    /// Run the pending render, if any; returns whether a render happened
    pub fn on_animation_frame(&mut self) -> bool {
        if !self.frame_pending {
            return false;
        }
        self.frame_pending = false;
        self.render();
        true
    }

    /// Move the scroll position to the top of `index` and schedule a render
    pub fn scroll_to_index(&mut self, index: usize) -> f64 {
        let last = self.items.len().saturating_sub(1);
        let offset = self.layout.offset(index.min(last));
        self.on_scroll(offset);
        offset
    }

    /// Replace the backing collection and repaint the current window from scratch
    pub fn update_items(&mut self, items: Vec<T>) {
        self.release_elements();
        self.items = items;
        self.layout = ListLayout::new(&self.item_height, self.items.len());
        self.render();
    }

    /// Tear down: detach listeners, destroy every element and the sizer
    ///
    /// Hands the host back to the caller.
    pub fn destroy(mut self) -> H {
        self.host.detach_scroll_listener();
        self.release_elements();
        self.host.remove_content_sizer();
        self.items.clear();
        self.window = None;
        self.frame_pending = false;
        self.host
    }

    fn release_elements(&mut self) {
        for (_, handle) in std::mem::take(&mut self.rendered) {
            self.host.destroy_element(handle);
        }
    }

    fn schedule_frame(&mut self) -> bool {
        if self.frame_pending {
            return false;
        }
        self.frame_pending = true;
        self.host.request_frame();
        true
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    /// Window computed by the last render pass
    pub fn visible_range(&self) -> Option<RangeInclusive<usize>> {
        self.window.clone()
    }

    pub fn rendered_indices(&self) -> Vec<usize> {
        self.rendered.keys().copied().collect()
    }

    pub fn rendered_handle(&self, index: usize) -> Option<&H::Handle> {
        self.rendered.get(&index)
    }

    pub fn total_height(&self) -> f64 {
        self.layout.total_height()
    }

    pub fn offset_of(&self, index: usize) -> f64 {
        self.layout.offset(index)
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn host(&self) -> &H {
        &self.host
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        index: usize,
        label: String,
        offset: f64,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum HostEvent {
        Created(usize),
        Destroyed(usize),
    }

    #[derive(Debug, Default)]
    struct MockHost {
        live: usize,
        events: Vec<HostEvent>,
        created: Vec<usize>,
        destroyed: Vec<usize>,
        content_height: Option<f64>,
        frames_requested: usize,
        listener_detached: bool,
        sizer_removed: bool,
        skip: Vec<usize>,
    }

    impl ElementHost<String> for MockHost {
        type Handle = Row;

        fn create_element(&mut self, item: &String, index: usize) -> Option<Row> {
            if self.skip.contains(&index) {
                return None;
            }
            self.live += 1;
            self.created.push(index);
            self.events.push(HostEvent::Created(index));
            Some(Row {
                index,
                label: item.clone(),
                offset: f64::NAN,
            })
        }

        fn position_element(&mut self, handle: &mut Row, offset: f64) {
            handle.offset = offset;
        }

        fn destroy_element(&mut self, handle: Row) {
            self.live -= 1;
            self.destroyed.push(handle.index);
            self.events.push(HostEvent::Destroyed(handle.index));
        }

        fn set_content_height(&mut self, height: f64) {
            self.content_height = Some(height);
        }

        fn remove_content_sizer(&mut self) {
            self.sizer_removed = true;
            self.content_height = None;
        }

        fn detach_scroll_listener(&mut self) {
            self.listener_detached = true;
        }

        fn request_frame(&mut self) {
            self.frames_requested += 1;
        }
    }

    fn clear_events(list: &mut VirtualList<String, MockHost>) {
        list.host.events.clear();
    }

    fn items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item {}", i)).collect()
    }

    fn fixed_list(n: usize, viewport: f64, buffer: usize) -> VirtualList<String, MockHost> {
        VirtualList::new(
            MockHost::default(),
            items(n),
            ItemHeight::Fixed(10.0),
            VirtualListOptions {
                viewport_height: viewport,
                buffer,
            },
        )
    }

    #[test]
    fn test_initial_render() {
        let mut list = fixed_list(1000, 100.0, 2);
        assert_eq!(list.state(), ListState::Idle);
        assert!(list.rendered_indices().is_empty());

        list.render();
        assert_eq!(list.state(), ListState::Rendered);
        assert_eq!(list.visible_range(), Some(0..=12));
        assert_eq!(list.rendered_indices(), (0..=12).collect::<Vec<_>>());
        assert_eq!(list.host().content_height, Some(10_000.0));

        let row = list.rendered_handle(5).unwrap();
        assert_eq!(row.offset, 50.0);
        assert_eq!(row.label, "item 5");
    }

    #[test]
    fn test_scroll_recycles_out_of_range_rows() {
        let mut list = fixed_list(1000, 100.0, 2);
        list.render();

        assert!(list.on_scroll(500.0));
        assert!(list.on_animation_frame());

        // floor(50) - 2 = 48, ceil(60) + 2 = 62
        assert_eq!(list.visible_range(), Some(48..=62));
        assert_eq!(list.rendered_indices(), (48..=62).collect::<Vec<_>>());
        assert_eq!(list.host().live, 15);
        assert_eq!(list.host().destroyed.len(), 13);
    }

    #[test]
    fn test_overlapping_scroll_keeps_existing_rows() {
        let mut list = fixed_list(1000, 100.0, 0);
        list.render();
        let created_before = list.host().created.len();

        list.on_scroll(30.0);
        list.on_animation_frame();

        // Window moves from 0..=10 to 3..=13: only 11, 12, 13 are new
        assert_eq!(list.host().created.len() - created_before, 3);
        assert_eq!(list.host().destroyed, vec![0, 1, 2]);
    }

    #[test]
    fn test_render_pass_destroys_before_creating() {
        let mut list = fixed_list(1000, 100.0, 2);
        list.render();

        for scroll in [30.0, 75.0, 500.0, 480.0, 0.0] {
            clear_events(&mut list);
            list.on_scroll(scroll);
            list.on_animation_frame();

            let events = &list.host().events;
            let last_destroy = events
                .iter()
                .rposition(|e| matches!(e, HostEvent::Destroyed(_)));
            let first_create = events
                .iter()
                .position(|e| matches!(e, HostEvent::Created(_)));
            if let (Some(destroy), Some(create)) = (last_destroy, first_create) {
                assert!(destroy < create, "scroll {} produced {:?}", scroll, events);
            }
            assert!(first_create.is_some() || last_destroy.is_some());
        }
    }

    #[test]
    fn test_scroll_bursts_coalesce_into_one_frame() {
        let mut list = fixed_list(1000, 100.0, 2);
        list.render();

        assert!(list.on_scroll(100.0));
        assert!(!list.on_scroll(200.0));
        assert!(!list.on_scroll(300.0));
        assert_eq!(list.host().frames_requested, 1);

        assert!(list.on_animation_frame());
        assert!(!list.on_animation_frame());
        assert_eq!(list.visible_range(), Some(28..=42));

        assert!(list.on_scroll(400.0));
        assert_eq!(list.host().frames_requested, 2);
    }

    #[test]
    fn test_resize_schedules_render() {
        let mut list = fixed_list(1000, 100.0, 0);
        list.render();
        assert!(list.on_resize(200.0));
        assert_eq!(list.viewport_height(), 200.0);
        list.on_animation_frame();
        assert_eq!(list.visible_range(), Some(0..=20));
    }

    #[test]
    fn test_update_items_replaces_everything() {
        let mut list = fixed_list(1000, 100.0, 1);
        list.render();
        let live_before = list.host().live;

        list.update_items(items(5));
        assert_eq!(list.host().destroyed.len(), live_before);
        assert_eq!(list.rendered_indices(), vec![0, 1, 2, 3, 4]);
        assert_eq!(list.host().content_height, Some(50.0));
        assert_eq!(list.items().len(), 5);
    }

    #[test]
    fn test_update_items_to_empty() {
        let mut list = fixed_list(100, 100.0, 1);
        list.render();
        list.update_items(Vec::new());
        assert!(list.rendered_indices().is_empty());
        assert_eq!(list.visible_range(), None);
        assert_eq!(list.host().live, 0);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut list = fixed_list(1000, 100.0, 2);
        list.render();
        list.on_scroll(50.0);

        let host = list.destroy();
        assert_eq!(host.live, 0);
        assert!(host.listener_detached);
        assert!(host.sizer_removed);
        assert_eq!(host.content_height, None);
    }

    #[test]
    fn test_missing_element_leaves_gap() {
        let mut host = MockHost::default();
        host.skip = vec![3];
        let mut list = VirtualList::new(
            host,
            items(10),
            ItemHeight::Fixed(10.0),
            VirtualListOptions {
                viewport_height: 50.0,
                buffer: 0,
            },
        );
        list.render();
        assert_eq!(list.rendered_indices(), vec![0, 1, 2, 4, 5]);
        assert!(list.rendered_handle(3).is_none());
    }

    #[test]
    fn test_variable_heights_positioning() {
        let mut list = VirtualList::new(
            MockHost::default(),
            items(6),
            ItemHeight::variable(|i| if i % 2 == 0 { 10.0 } else { 30.0 }),
            VirtualListOptions {
                viewport_height: 30.0,
                buffer: 0,
            },
        );
        list.on_scroll(45.0);
        list.on_animation_frame();
        assert_eq!(list.rendered_indices(), vec![2, 3]);
        assert_eq!(list.rendered_handle(3).unwrap().offset, 50.0);
        assert_eq!(list.total_height(), 120.0);
    }

    #[test]
    fn test_scroll_to_index() {
        let mut list = fixed_list(1000, 100.0, 0);
        assert_eq!(list.scroll_to_index(250), 2500.0);
        assert_eq!(list.scroll_top(), 2500.0);
        list.on_animation_frame();
        assert_eq!(list.visible_range(), Some(250..=260));

        // Past the end clamps to the last item
        assert_eq!(list.scroll_to_index(5000), 9990.0);
    }

    #[test]
    fn test_options_from_config() {
        let config = VirtualListConfig {
            buffer: 7,
            item_height: 2.0,
        };
        let options = VirtualListOptions::from_config(&config, 40.0);
        assert_eq!(options.buffer, 7);
        assert_eq!(options.viewport_height, 40.0);
    }

    proptest! {
        #[test]
        fn rendered_set_matches_window(
            n in 0usize..300,
            height in 1u32..50,
            scroll_steps in proptest::collection::vec(0u32..20_000, 1..6),
            viewport in 0u32..800,
            buffer in 0usize..6,
        ) {
            let mut list = VirtualList::new(
                MockHost::default(),
                items(n),
                ItemHeight::Fixed(height as f64),
                VirtualListOptions { viewport_height: viewport as f64, buffer },
            );

            for scroll in scroll_steps {
                list.on_scroll(scroll as f64);
                list.on_animation_frame();

                let expected: Vec<usize> = list.visible_range().map(|r| r.collect()).unwrap_or_default();
                prop_assert_eq!(list.rendered_indices(), expected.clone());
                prop_assert_eq!(list.host().live, expected.len());
                for index in expected {
                    let row = list.rendered_handle(index).unwrap();
                    prop_assert_eq!(row.offset, index as f64 * height as f64);
                }
            }
        }

        #[test]
        fn variable_offsets_are_cumulative(
            heights in proptest::collection::vec(0u32..40, 0..200),
            scroll_steps in proptest::collection::vec(0u32..5_000, 1..6),
            viewport in 0u32..400,
            buffer in 0usize..4,
        ) {
            let n = heights.len();
            let table = heights.clone();
            let mut list = VirtualList::new(
                MockHost::default(),
                items(n),
                ItemHeight::variable(move |i| table[i] as f64),
                VirtualListOptions { viewport_height: viewport as f64, buffer },
            );

            let mut cumulative = Vec::with_capacity(n);
            let mut sum = 0u32;
            for h in &heights {
                cumulative.push(sum as f64);
                sum += h;
            }
            prop_assert_eq!(list.total_height(), sum as f64);
            for (index, expected) in cumulative.iter().enumerate() {
                prop_assert_eq!(list.offset_of(index), *expected);
            }

            for scroll in scroll_steps {
                list.on_scroll(scroll as f64);
                list.on_animation_frame();

                let expected: Vec<usize> = list.visible_range().map(|r| r.collect()).unwrap_or_default();
                prop_assert_eq!(list.rendered_indices(), expected.clone());
                for index in expected {
                    let row = list.rendered_handle(index).unwrap();
                    prop_assert_eq!(row.offset, cumulative[index]);
                }
            }
        }
    }
}
