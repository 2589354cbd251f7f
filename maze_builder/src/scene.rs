// scene.rs - Renderer-facing state of the maze under construction

use serde::Serialize;

use crate::animation::{Bounds, CellLight, Vec3};
use crate::maze::{Direction, Grid};

/// Floor plane transform. `goal_scale` is the footprint of the finished maze.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloorState {
    pub center: Vec3,
    pub goal_scale: Vec3,
    pub scale: Vec3,
    pub yaw_degrees: f32,
}

/// Scene representation of one maze cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellBlock {
    pub row: u32,
    pub col: u32,
    pub position: Vec3,
    pub scale: Vec3,
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
    pub lit: bool,
}

impl CellBlock {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.position, self.scale)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MazeScene {
    floor: FloorState,
    cols: u32,
    blocks: Vec<CellBlock>,
    lights: Vec<CellLight>,
    goal_trigger: Option<(u32, u32)>,
    entry_point: Option<Vec3>,
}

impl MazeScene {
    pub fn new(center: Vec3) -> Self {
        Self {
            floor: FloorState {
                center,
                goal_scale: Vec3::zero(),
                scale: Vec3::zero(),
                yaw_degrees: 0.0,
            },
            cols: 0,
            blocks: Vec::new(),
            lights: Vec::new(),
            goal_trigger: None,
            entry_point: None,
        }
    }

    pub fn floor(&self) -> &FloorState {
        &self.floor
    }

    pub fn blocks(&self) -> &[CellBlock] {
        &self.blocks
    }

    pub fn lights(&self) -> &[CellLight] {
        &self.lights
    }

    pub fn goal_trigger(&self) -> Option<(u32, u32)> {
        self.goal_trigger
    }

    pub fn entry_point(&self) -> Option<Vec3> {
        self.entry_point
    }

    /// Size the floor for a `rows x cols` maze; it starts collapsed
    pub fn prepare_floor(&mut self, rows: u32, cols: u32, block_size: f32) {
        self.floor.goal_scale = Vec3::new(cols as f32 * block_size, 1.0, rows as f32 * block_size);
        self.floor.scale = Vec3::zero();
        self.floor.yaw_degrees = 0.0;
    }

    /// Footprint of the finished floor, flat on the floor plane
    pub fn floor_bounds(&self) -> Bounds {
        let goal = self.floor.goal_scale;
        Bounds::new(self.floor.center, Vec3::new(goal.x, 0.0, goal.z))
    }

    /// Scale the floor by `m` of its goal size while spinning it `rotations` times over 0..1
    pub fn set_floor_progress(&mut self, m: f32, rotations: u32) {
        self.floor.scale = self.floor.goal_scale * m;
        self.floor.yaw_degrees = (rotations as f32 * 360.0 * m) % 360.0;
    }

    pub fn snap_floor(&mut self) {
        self.floor.scale = self.floor.goal_scale;
        self.floor.yaw_degrees = 0.0;
    }

    /// One flat block per cell. The top-left block sits half a block in from
    /// the floor corner; columns run along +x and rows along -z.
    pub fn place_blocks(&mut self, grid: &Grid, block_size: f32) {
        let center = self.floor.center;
        let extents = self.floor_bounds().extents();
        let top_left = Vec3::new(
            center.x - extents.x + block_size * 0.5,
            center.y,
            center.z + extents.z - block_size * 0.5,
        );

        self.cols = grid.cols();
        self.blocks = grid
            .cells()
            .iter()
            .map(|cell| CellBlock {
                row: cell.row,
                col: cell.col,
                position: Vec3::new(
                    top_left.x + block_size * cell.col as f32,
                    top_left.y,
                    top_left.z - block_size * cell.row as f32,
                ),
                scale: Vec3::new(block_size, 0.0, block_size),
                north: cell.has_wall(Direction::North),
                south: cell.has_wall(Direction::South),
                east: cell.has_wall(Direction::East),
                west: cell.has_wall(Direction::West),
                lit: false,
            })
            .collect();
        self.goal_trigger = Some(grid.goal_cell());
    }

    /// Walls at fraction `m` of full height, resting on the floor
    pub fn set_wall_progress(&mut self, m: f32, block_size: f32, wall_height: f32) {
        let height = wall_height * m;
        let base_y = self.floor.center.y;
        for block in &mut self.blocks {
            block.scale = Vec3::new(block_size, height, block_size);
            block.position.y = base_y + height * 0.5;
        }
    }

    pub fn block(&self, row: u32, col: u32) -> Option<&CellBlock> {
        row_major(row, col, self.cols).and_then(|i| self.blocks.get(i))
    }

    pub fn add_light(&mut self, light: CellLight) {
        let index = row_major(light.row, light.col, self.cols);
        if let Some(block) = index.and_then(|i| self.blocks.get_mut(i)) {
            block.lit = true;
        }
        self.lights.push(light);
    }

    pub fn set_entry_point(&mut self, point: Vec3) {
        self.entry_point = Some(point);
    }

    /// Remove everything except the floor centre
    pub fn clear(&mut self) {
        *self = Self::new(self.floor.center);
    }
}

fn row_major(row: u32, col: u32, cols: u32) -> Option<usize> {
    (col < cols).then(|| row as usize * cols as usize + col as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::LightKind;
    use crate::maze::generate;

    fn scene_for(rows: u32, cols: u32) -> (MazeScene, Grid) {
        let grid = generate(rows, cols, 11).unwrap();
        let mut scene = MazeScene::new(Vec3::zero());
        scene.prepare_floor(rows, cols, 10.0);
        scene.place_blocks(&grid, 10.0);
        (scene, grid)
    }

    #[test]
    fn test_floor_progress_spins_and_snaps() {
        let mut scene = MazeScene::new(Vec3::zero());
        scene.prepare_floor(2, 3, 10.0);
        assert_eq!(scene.floor().scale, Vec3::zero());

        scene.set_floor_progress(0.5, 2);
        assert_eq!(scene.floor().scale, Vec3::new(15.0, 0.5, 10.0));
        assert_eq!(scene.floor().yaw_degrees, 0.0);

        scene.set_floor_progress(0.25, 2);
        assert_eq!(scene.floor().yaw_degrees, 180.0);

        scene.snap_floor();
        assert_eq!(scene.floor().scale, Vec3::new(30.0, 1.0, 20.0));
        assert_eq!(scene.floor().yaw_degrees, 0.0);
    }

    #[test]
    fn test_block_layout() {
        let (scene, _) = scene_for(2, 3);
        assert_eq!(scene.blocks().len(), 6);

        let top_left = scene.block(0, 0).unwrap();
        assert_eq!(top_left.position, Vec3::new(-10.0, 0.0, 5.0));
        let bottom_right = scene.block(1, 2).unwrap();
        assert_eq!(bottom_right.position, Vec3::new(10.0, 0.0, -5.0));
        assert!(scene.block(0, 3).is_none());
        assert!(scene.block(2, 0).is_none());
    }

    #[test]
    fn test_blocks_carry_wall_flags() {
        let (scene, grid) = scene_for(4, 4);
        for (block, cell) in scene.blocks().iter().zip(grid.cells()) {
            assert_eq!(
                (block.north, block.south, block.east, block.west),
                (cell.north, cell.south, cell.east, cell.west)
            );
        }
    }

    #[test]
    fn test_walls_rise_together_from_the_floor() {
        let (mut scene, _) = scene_for(3, 3);
        assert!(scene.blocks().iter().all(|b| b.scale.y == 0.0));

        scene.set_wall_progress(0.5, 10.0, 10.0);
        for block in scene.blocks() {
            assert_eq!(block.scale, Vec3::new(10.0, 5.0, 10.0));
            assert_eq!(block.position.y, 2.5);
        }

        scene.set_wall_progress(1.0, 10.0, 10.0);
        assert!(scene.blocks().iter().all(|b| b.position.y == 5.0));
    }

    #[test]
    fn test_placement_sets_goal_trigger() {
        let (mut scene, grid) = scene_for(2, 2);
        assert_eq!(scene.goal_trigger(), Some(grid.goal_cell()));

        for light in crate::animation::plan_lights(&grid, 10.0) {
            scene.add_light(light);
        }
        assert_eq!(scene.goal_trigger(), Some((0, 1)));
        assert!(scene.block(0, 1).unwrap().lit);
        assert!(!scene.block(1, 1).unwrap().lit);

        scene.clear();
        assert!(scene.blocks().is_empty() && scene.lights().is_empty());
        assert_eq!(scene.goal_trigger(), None);
    }

    #[test]
    fn test_single_cell_goal_trigger_under_entry_light() {
        let (mut scene, grid) = scene_for(1, 1);
        let lights = crate::animation::plan_lights(&grid, 10.0);
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].kind, LightKind::Entry);
        for light in lights {
            scene.add_light(light);
        }
        assert_eq!(scene.goal_trigger(), Some((0, 0)));
    }
}
