//! Tilt Passage entry point
//!
//! Headless native driver: builds a movable passage level, feeds it a
//! scripted gesture sequence from another thread and runs the fixed
//! timestep loop until the script stops or the ball reaches the end.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::thread;
    use std::time::Duration;

    use glam::{Vec2, Vec3};

    use tilt_passage::consts::*;
    use tilt_passage::input::{
        Gesture, GestureSender, InteractionController, OrthoProjection, gesture_channel,
    };
    use tilt_passage::renderer::DrawBuilder;
    use tilt_passage::sim::{BlockRole, Level, PieceKind, Viewport, Wall, build_movable, update_data};
    use tilt_passage::{LevelError, MovablePassageConfig};

    const SCREEN: Vec2 = Vec2::new(1080.0, 1920.0);
    const WORLD: Vec2 = Vec2::new(9.0, 16.0);
    /// Give up after this many frames
    const MAX_FRAMES: u32 = 60 * 30;

    /// Drag the first staged piece onto the free cell above the chute opening,
    /// then tilt the device so the ball rolls up into it
    fn script(level: &Level, projection: &OrthoProjection) -> Vec<Gesture> {
        let board = &level.board;
        let mut gestures = Vec::new();
        let staged = board.catalog.iter().find(|(_, p)| {
            !p.fixed && p.kind == PieceKind::Straight && board.role(p.row, p.col) == Some(BlockRole::OffBoard)
        });
        let gap = (0..board.cols()).find(|&col| {
            board
                .primary_at(ROWS_FOR_START - 1, col)
                .is_some_and(|id| !board.catalog[id].has_wall_at(Wall::Up))
        });
        let target = gap.and_then(|col| {
            (ROWS_FOR_START..board.rows()).map(|row| (row, col)).find(|&(row, col)| {
                board.role(row, col) == Some(BlockRole::OnBoard)
                    && board
                        .primary_at(row, col)
                        .is_some_and(|id| board.catalog[id].kind == PieceKind::Dirt)
            })
        });

        if let (Some((_, piece)), Some((row, col))) = (staged, target) {
            let from = projection.to_screen(board.position(piece.row, piece.col).truncate());
            let to = projection.to_screen(board.position(row, col).truncate());
            let steps = 8;
            let step = (to - from) / steps as f32;
            for _ in 0..steps {
                gestures.push(Gesture::Drag { start: from, delta: step });
            }
            gestures.push(Gesture::DragEnded { at: to });
        }
        gestures.push(Gesture::Tilt(Vec3::new(0.0, -20.0, 0.0)));
        gestures
    }

    fn feed(tx: GestureSender, gestures: Vec<Gesture>, run_for: Duration) {
        for gesture in gestures {
            if tx.send(gesture).is_err() {
                return;
            }
            thread::sleep(Duration::from_millis(30));
        }
        thread::sleep(run_for);
        tx.stop();
    }

    pub fn run() -> Result<(), LevelError> {
        env_logger::init();
        log::info!("Tilt Passage (native) starting...");

        let config = match std::env::args().nth(1) {
            Some(path) => {
                log::info!("Loading level from {}", path);
                MovablePassageConfig::load(path)?
            }
            None => MovablePassageConfig::default(),
        };
        let viewport = Viewport::new(WORLD.x, WORLD.y)?;
        let mut level = build_movable(&config, viewport)?;
        let mut drawer = DrawBuilder::for_movable(&config);
        let projection = OrthoProjection::new(SCREEN.x, SCREEN.y, WORLD.x, WORLD.y);
        let controller = InteractionController::new(projection);

        let (tx, rx) = gesture_channel(MAX_GESTURES_PER_FRAME);
        let gestures = script(&level, &projection);
        let feeder = thread::spawn(move || feed(tx, gestures, Duration::from_secs(5)));

        let mut frames = 0;
        let mut redraws = 0;
        let mut textures_generation = 0;
        while frames < MAX_FRAMES && !level.is_finished() {
            let outcome = controller.pump(&mut level, &rx);
            if outcome.stopped {
                log::info!("Gesture feed stopped");
                break;
            }
            let redraw = update_data(&mut level, SIM_DT) || outcome.redraw;
            if redraw {
                let list = drawer.build(&mut level);
                if list.textures_generation != textures_generation {
                    textures_generation = list.textures_generation;
                    log::debug!("Texture table now holds {} entries", drawer.textures().len());
                }
                redraws += 1;
            }
            frames += 1;
            thread::sleep(Duration::from_secs_f32(SIM_DT));
        }

        if feeder.join().is_err() {
            log::warn!("Gesture feed thread panicked");
        }
        log::info!(
            "Ran {} frames ({} redraws); finished: {}; ball at ({}, {}); path {:?}",
            frames,
            redraws,
            level.is_finished(),
            level.ball.row,
            level.ball.col,
            level.locked_path()
        );
        level.end();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = native::run() {
        log::error!("Failed to run level: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on the web; nothing to run here
}
