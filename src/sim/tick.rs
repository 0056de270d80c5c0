//! Fixed timestep simulation tick
//!
//! Advances the ball one step: velocity, motion inside the current piece,
//! then the cell change and path bookkeeping when it crosses a wall.

use glam::{Vec2, Vec3};

use super::board::BlockRole;
use super::motion::{MotionParams, move_ball_in_cell};
use super::state::Level;
use crate::consts::*;

/// Advance the level by `dt` seconds
///
/// Returns true when the scene needs to be redrawn.
pub fn update_data(level: &mut Level, dt: f32) -> bool {
    if level.is_finished() || dt < FLOAT_ERROR {
        return false;
    }

    let drag_constant = level.physics.drag_constant;
    level.ball.velocity = level.ball.updated_velocity(dt, drag_constant);
    if level.ball.velocity.length() < FLOAT_ERROR {
        return false;
    }

    let (row, col) = (level.ball.row, level.ball.col);
    let center = level.board.position(row, col);
    let Some(old) = level.board.primary_at(row, col) else {
        log::warn!("ball is in empty cell ({}, {})", row, col);
        level.ball.velocity = Vec3::ZERO;
        return false;
    };
    let (kind, turns) = {
        let piece = &level.board.catalog[old];
        (piece.kind, piece.quarter_turns)
    };

    let params = MotionParams {
        block_size: level.board.block_size(),
        ball_radius: level.ball.radius,
        bounce: level.physics.bounce_enabled,
    };
    let mut pos = (level.ball.position - center).truncate();
    let mut vel = level.ball.velocity.truncate();
    let board = &level.board;
    let exits = move_ball_in_cell(kind, turns, &mut pos, &mut vel, dt, &params, |w1, w2| {
        board.next_wall_candidates(w1, w2, row, col)
    });

    level.ball.velocity = vel.extend(0.0);
    level.ball.position = center + pos.extend(0.0);
    level.ball.update_rotation(dt);

    if exits.is_empty() {
        return level.drawing_necessary();
    }

    let (drow, dcol) = exits.step();
    let (Some(new_row), Some(new_col)) = (row.checked_add_signed(drow), col.checked_add_signed(dcol))
    else {
        log::warn!("ball left the grid from ({}, {})", row, col);
        return level.drawing_necessary();
    };
    enter_cell(level, pos, (row, col), (new_row, new_col));

    if level.board.is_goal(new_row, new_col) {
        level.finish();
        return true;
    }

    let in_chute = |r, c| level.board.role(r, c) == Some(BlockRole::Begin);
    if in_chute(row, col) && in_chute(new_row, new_col) {
        return level.drawing_necessary();
    }

    let Some(new) = level.board.primary_at(new_row, new_col) else {
        log::warn!("ball rolled into empty cell ({}, {})", new_row, new_col);
        return true;
    };
    level.board.catalog.link_transition(old, new);
    true
}

/// Move the ball's cell, keeping its world position continuous
fn enter_cell(level: &mut Level, offset: Vec2, from: (u32, u32), to: (u32, u32)) {
    let old_center = level.board.position(from.0, from.1);
    let new_center = level.board.position(to.0, to.1);
    let world = old_center.truncate() + offset;
    level.ball.row = to.0;
    level.ball.col = to.1;
    level.ball.position = world.extend(new_center.z);
}
