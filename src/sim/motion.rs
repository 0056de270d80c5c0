//! Ball motion inside a single cell
//!
//! Positions are offsets from the cell center. Motion is solved in the
//! piece's own frame (rotation undone) and rotated back afterwards, so each
//! piece only needs its rotation-0 wall mask.

use glam::Vec2;

use super::piece::PieceKind;
use super::wall::{Wall, WallSet};
use crate::consts::FLOAT_ERROR;
use crate::{rotate_quarter_ccw, rotate_quarter_cw};

/// Walls the ball passed through this step, in the board frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Exits {
    pub first: Option<Wall>,
    pub second: Option<Wall>,
}

impl Exits {
    pub const NONE: Exits = Exits {
        first: None,
        second: None,
    };

    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.second.is_none()
    }

    pub fn contains(&self, wall: Wall) -> bool {
        self.first == Some(wall) || self.second == Some(wall)
    }

    /// Row and column change for these exits
    pub fn step(&self) -> (i32, i32) {
        let col = if self.contains(Wall::Left) {
            -1
        } else if self.contains(Wall::Right) {
            1
        } else {
            0
        };
        let row = if self.contains(Wall::Down) {
            -1
        } else if self.contains(Wall::Up) {
            1
        } else {
            0
        };
        (row, col)
    }

    fn rotated(self, quarter_turns: u8) -> Self {
        Self {
            first: self.first.map(|w| w.rotated(quarter_turns)),
            second: self.second.map(|w| w.rotated(quarter_turns)),
        }
    }
}

/// Cell geometry and response settings for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub block_size: f32,
    pub ball_radius: f32,
    /// Reflect off closed walls instead of stopping
    pub bounce: bool,
}

impl MotionParams {
    #[inline]
    fn half(&self) -> f32 {
        self.block_size / 2.0
    }
}

/// Stop or reflect a velocity component that ran into a wall
#[inline]
fn halt(speed: &mut f32, bounce: bool) {
    *speed = if bounce { -*speed } else { 0.0 };
}

/// Move the ball through the piece it is in
///
/// `next_wall` is asked, in the piece's frame, whether the neighbouring cells
/// accept the ball through up to two walls. `pos` and `vel` are updated in
/// place; the returned exits say which board-frame walls were crossed.
pub fn move_ball_in_cell<F>(
    kind: PieceKind,
    quarter_turns: u8,
    pos: &mut Vec2,
    vel: &mut Vec2,
    dt: f32,
    params: &MotionParams,
    next_wall: F,
) -> Exits
where
    F: FnMut(Option<Wall>, Option<Wall>) -> (bool, bool),
{
    if kind.is_filler() {
        *vel = Vec2::ZERO;
        return Exits::NONE;
    }

    let mut local_pos = rotate_quarter_ccw(*pos, quarter_turns);
    let mut local_vel = rotate_quarter_ccw(*vel, quarter_turns);
    let exits = if kind.is_open_area() {
        move_in_open_area(
            kind.closed_walls(),
            &mut local_pos,
            &mut local_vel,
            dt,
            params,
            next_wall,
        )
    } else {
        move_in_junction(
            kind.closed_walls(),
            &mut local_pos,
            &mut local_vel,
            dt,
            params,
            next_wall,
        )
    };
    *pos = rotate_quarter_cw(local_pos, quarter_turns);
    *vel = rotate_quarter_cw(local_vel, quarter_turns);
    exits.rotated(quarter_turns)
}

/// Keep the ball inside the tunnel arms of a junction piece
fn clamp_to_arms(closed: WallSet, pos: &mut Vec2, vel: &mut Vec2, next: Vec2) {
    fn clamp_axis(low_closed: bool, high_closed: bool, p: &mut f32, v: &mut f32, next: f32) {
        if low_closed && high_closed {
            *p = 0.0;
            *v = 0.0;
        } else if low_closed {
            if next < 0.0 || *p < 0.0 {
                *p = 0.0;
                *v = v.max(0.0);
            }
        } else if high_closed && (next > 0.0 || *p > 0.0) {
            *p = 0.0;
            *v = v.min(0.0);
        }
    }
    clamp_axis(
        closed.contains(Wall::Left),
        closed.contains(Wall::Right),
        &mut pos.x,
        &mut vel.x,
        next.x,
    );
    clamp_axis(
        closed.contains(Wall::Down),
        closed.contains(Wall::Up),
        &mut pos.y,
        &mut vel.y,
        next.y,
    );
}

fn move_in_junction<F>(
    closed: WallSet,
    pos: &mut Vec2,
    vel: &mut Vec2,
    dt: f32,
    params: &MotionParams,
    mut next_wall: F,
) -> Exits
where
    F: FnMut(Option<Wall>, Option<Wall>) -> (bool, bool),
{
    let projected = *pos + *vel * dt;
    clamp_to_arms(closed, pos, vel, projected);
    if *vel == Vec2::ZERO {
        return Exits::NONE;
    }

    let h = params.half();
    let r = params.ball_radius;
    let mut next = *pos + *vel * dt;

    let mut corridor = |p: &mut f32, speed: &mut f32, low: Wall, high: Wall| -> Option<Wall> {
        let (wall, border, sign) = if *p < -h + r {
            (low, -h, -1.0)
        } else if *p > h - r {
            (high, h, 1.0)
        } else {
            return None;
        };
        let open = next_wall(Some(wall), None).0;
        let past = sign * (*p - border) > 0.0;
        if past && open {
            *p = border + sign * FLOAT_ERROR;
            Some(wall)
        } else if !open && (past || sign * *speed > 0.0) {
            *p = border - sign * r;
            halt(speed, params.bounce);
            None
        } else {
            None
        }
    };

    let exit = if (next.x - pos.x).abs() > (next.y - pos.y).abs() {
        let exit = corridor(&mut next.x, &mut vel.x, Wall::Left, Wall::Right);
        if next.x.abs() > r / 4.0 {
            next.y = 0.0;
            vel.y = 0.0;
        }
        exit
    } else {
        let exit = corridor(&mut next.y, &mut vel.y, Wall::Down, Wall::Up);
        if next.y.abs() > r / 4.0 {
            next.x = 0.0;
            vel.x = 0.0;
        }
        exit
    };
    *pos = next;
    Exits {
        first: exit,
        second: None,
    }
}

/// Per-side bound of an open-area piece: interior half walls sit at the center
#[derive(Debug, Clone, Copy)]
struct Side {
    wall: Wall,
    bound: f32,
    interior: bool,
}

fn move_in_open_area<F>(
    closed: WallSet,
    pos: &mut Vec2,
    vel: &mut Vec2,
    dt: f32,
    params: &MotionParams,
    mut next_wall: F,
) -> Exits
where
    F: FnMut(Option<Wall>, Option<Wall>) -> (bool, bool),
{
    let h = params.half();
    let r = params.ball_radius;
    let sides = Wall::ALL.map(|wall| {
        let interior = closed.contains(wall);
        Side {
            wall,
            bound: if interior { 0.0 } else { wall.sign() * h },
            interior,
        }
    });
    let bound = |wall: Wall| {
        sides
            .iter()
            .find(|s| s.wall == wall)
            .map_or(0.0, |s| s.bound)
    };
    let axis = |v: Vec2, wall: Wall| if wall.is_vertical_side() { v.x } else { v.y };

    // Earliest side the ball would reach
    let mut hit: Option<(Wall, f32)> = None;
    for s in sides {
        let speed = axis(*vel, s.wall);
        if speed.abs() < FLOAT_ERROR {
            continue;
        }
        let t = (s.bound - axis(*pos, s.wall)) / speed;
        if t < FLOAT_ERROR {
            continue;
        }
        if hit.is_none_or(|(_, best)| t < best) {
            hit = Some((s.wall, t));
        }
    }
    let (mut wall1, travel) = match hit {
        Some((wall, t)) if t <= dt => (Some(wall), t),
        _ => (None, dt),
    };
    let mut next = *pos + *vel * travel;

    let beyond_y = |p: Vec2| {
        if p.y > bound(Wall::Up) {
            Some(Wall::Up)
        } else if p.y < bound(Wall::Down) {
            Some(Wall::Down)
        } else {
            None
        }
    };
    let beyond_x = |p: Vec2| {
        if p.x > bound(Wall::Right) {
            Some(Wall::Right)
        } else if p.x < bound(Wall::Left) {
            Some(Wall::Left)
        } else {
            None
        }
    };
    let mut wall2 = match wall1 {
        None => {
            wall1 = beyond_y(next);
            beyond_x(next)
        }
        Some(w) if w.is_vertical_side() => beyond_y(next),
        Some(_) => beyond_x(next),
    };

    // Interior half walls stop the ball without asking the neighbours
    for s in sides.iter().filter(|s| s.interior) {
        let stopped = if wall1 == Some(s.wall) {
            wall1 = None;
            true
        } else if wall2 == Some(s.wall) {
            wall2 = None;
            true
        } else {
            false
        };
        if stopped {
            if s.wall.is_vertical_side() {
                next.x = s.bound;
                vel.x = 0.0;
            } else {
                next.y = s.bound;
                vel.y = 0.0;
            }
        }
    }

    if wall1.is_none() && wall2.is_none() {
        *pos = next;
        return Exits::NONE;
    }

    let (open1, open2) = next_wall(wall1, wall2);
    for s in sides {
        let crossing = (open1 && wall1 == Some(s.wall)) || (open2 && wall2 == Some(s.wall));
        let blocked = (!open1 && wall1 == Some(s.wall)) || (!open2 && wall2 == Some(s.wall));
        let sign = s.wall.sign();
        let (p, v) = if s.wall.is_vertical_side() {
            (&mut next.x, &mut vel.x)
        } else {
            (&mut next.y, &mut vel.y)
        };
        if crossing {
            *p = s.bound + sign * FLOAT_ERROR;
        } else if blocked {
            *p = s.bound - sign * r;
            halt(v, params.bounce);
        }
    }

    *pos = next;
    Exits {
        first: wall1.filter(|_| open1),
        second: wall2.filter(|_| open2),
    }
}
