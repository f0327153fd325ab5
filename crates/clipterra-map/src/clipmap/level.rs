use crate::core::glam::{IVec2, UVec2, Vec2};
use crate::core::rect::TileRect;
use crate::core::units::TileUnits;
use crate::{TileAddress, TileRequest};

/// What a slot of the clip window currently holds, or is waiting for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotState {
    Empty,
    /// A request for this tile is outstanding.
    Pending(IVec2),
    Resident(IVec2),
    /// Every attempt to load this tile failed. The slot holds placeholder texels.
    Missing(IVec2),
}

impl SlotState {
    pub fn tile(&self) -> Option<IVec2> {
        match *self {
            Self::Empty => None,
            Self::Pending(t) | Self::Resident(t) | Self::Missing(t) => Some(t),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Slot {
    /// Bumped every time the slot is assigned a new tile. Never decreases.
    pub generation: u32,
    pub state: SlotState,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            generation: 0,
            state: SlotState::Empty,
        }
    }
}

/// One level of detail of the clipmap: a toroidal `clip_tile_count²` window over the level's tile grid.
#[derive(Clone, Debug)]
pub struct ClipLevel {
    index: u32,
    grid_size: u32,
    clip_tile_count: u32,
    loaded_region: TileRect,
    slots: Vec<Slot>,
}

impl ClipLevel {
    pub fn new(index: u32, grid_size: u32, clip_tile_count: u32) -> Self {
        debug_assert!(grid_size >= clip_tile_count);
        Self {
            index,
            grid_size,
            clip_tile_count,
            loaded_region: TileRect::EMPTY,
            slots: vec![Slot::default(); (clip_tile_count * clip_tile_count) as usize],
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn clip_tile_count(&self) -> u32 {
        self.clip_tile_count
    }

    /// The window requested by the last [`update`](Self::update), or empty if there hasn't been one.
    pub fn loaded_region(&self) -> TileRect {
        self.loaded_region
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The window centered on `norm` (the observer position in `[0, 1]²` of the virtual texture), clamped to the grid.
    ///
    /// Centers are rounded half to even. Positions off the texture (including infinite ones) get the nearest edge window.
    pub fn required_region(&self, norm: Vec2) -> TileRect {
        let grid = self.grid_size as i32;
        let clip = self.clip_tile_count as i32;
        // Clamp before converting, so the integer math below can't overflow.
        let scaled = (norm * self.grid_size as f32).clamp(Vec2::ZERO, Vec2::splat(self.grid_size as f32));
        let center = IVec2::new(
            scaled.x.round_ties_even() as i32,
            scaled.y.round_ties_even() as i32,
        );
        let start = (center - IVec2::splat(clip / 2)).clamp(IVec2::ZERO, IVec2::splat(grid - clip));
        TileRect::square(start, clip)
    }

    /// Toroidal slot of `tile`.
    pub fn slot_of(&self, tile: IVec2) -> TileUnits<UVec2> {
        TileUnits(tile.rem_euclid(IVec2::splat(self.clip_tile_count as i32)).as_uvec2())
    }

    fn slot_index(&self, slot: TileUnits<UVec2>) -> usize {
        let TileUnits(s) = slot;
        (s.y * self.clip_tile_count + s.x) as usize
    }

    pub fn slot(&self, slot: TileUnits<UVec2>) -> &Slot {
        &self.slots[self.slot_index(slot)]
    }

    /// Reassigns the slot of `tile` to it and returns the slot's new generation.
    pub fn assign(&mut self, tile: IVec2) -> (TileUnits<UVec2>, u32) {
        let slot = self.slot_of(tile);
        let i = self.slot_index(slot);
        let entry = &mut self.slots[i];
        entry.generation = entry.generation.wrapping_add(1);
        entry.state = SlotState::Pending(tile);
        (slot, entry.generation)
    }

    /// True iff nothing has been assigned to `slot` since `generation` was issued.
    pub fn is_current(&self, slot: TileUnits<UVec2>, generation: u32) -> bool {
        self.slot(slot).generation == generation
    }

    pub fn mark_resident(&mut self, slot: TileUnits<UVec2>) {
        let i = self.slot_index(slot);
        if let Some(tile) = self.slots[i].state.tile() {
            self.slots[i].state = SlotState::Resident(tile);
        }
    }

    pub fn mark_missing(&mut self, slot: TileUnits<UVec2>) {
        let i = self.slot_index(slot);
        if let Some(tile) = self.slots[i].state.tile() {
            self.slots[i].state = SlotState::Missing(tile);
        }
    }

    /// Moves the window to follow `norm` and returns a request for every tile that entered it. Tiles still inside the
    /// previous window are not requested again.
    pub fn update(&mut self, norm: Vec2) -> Vec<TileRequest> {
        let required = self.required_region(norm);
        if required == self.loaded_region {
            return Vec::new();
        }

        let previous = self.loaded_region;
        let entering: Vec<IVec2> = required.iter().filter(|t| !previous.contains(*t)).collect();
        let mut requests = Vec::with_capacity(entering.len());
        for tile in entering {
            let (slot, generation) = self.assign(tile);
            requests.push(TileRequest {
                address: TileAddress::new(self.index, tile.x as u32, tile.y as u32),
                slot,
                generation,
                attempt: 0,
            });
        }
        self.loaded_region = required;

        requests
    }

    pub fn count_slots(&self, mut predicate: impl FnMut(&SlotState) -> bool) -> usize {
        self.slots.iter().filter(|s| predicate(&s.state)).count()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
