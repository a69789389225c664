use rand::Rng;

use crate::*;

/// Open cells reached from `origin` walking in `direction`, origin excluded.
fn run(board: &Board, origin: Coord2, direction: Direction) -> Vec<Coord2> {
    let size = board.size();
    let mut cells = Vec::new();
    let mut cursor = origin;
    while let Some(next) = direction.step(cursor, size) {
        if board[next].is_wall() {
            break;
        }
        cells.push(next);
        cursor = next;
    }
    cells
}

fn line_through(board: &Board, origin: Coord2, (back, forth): (Direction, Direction)) -> Vec<Coord2> {
    let mut line = run(board, origin, back);
    line.reverse();
    line.push(origin);
    line.extend(run(board, origin, forth));
    line
}

/// Draws wall lines across open space, one random interior cell per attempt.
///
/// Each line follows the shorter open run through the picked cell and stops at existing walls
/// or the board edge. A line is dropped if it would run alongside another wall, so every wall
/// keeps open cells on both sides. Returns how many lines were drawn.
pub fn carve_walls<R: Rng + ?Sized>(board: &mut Board, rng: &mut R, attempts: u32) -> usize {
    let size = board.size();
    if size < 3 {
        return 0;
    }

    let entry = board.entry();
    let mut lines = 0;
    for _ in 0..attempts {
        let origin = (rng.random_range(1..size - 1), rng.random_range(1..size - 1));
        if origin == entry || board[origin].is_wall() {
            continue;
        }

        let horizontal = line_through(board, origin, (Direction::Left, Direction::Right));
        let vertical = line_through(board, origin, (Direction::Up, Direction::Down));
        let (line, across) = match horizontal.len().cmp(&vertical.len()) {
            core::cmp::Ordering::Less => (horizontal, (Direction::Up, Direction::Down)),
            core::cmp::Ordering::Greater => (vertical, (Direction::Left, Direction::Right)),
            core::cmp::Ordering::Equal if rng.random_bool(0.5) => {
                (horizontal, (Direction::Up, Direction::Down))
            }
            core::cmp::Ordering::Equal => (vertical, (Direction::Left, Direction::Right)),
        };

        let hugs_wall = line.iter().any(|&cell| {
            [across.0, across.1]
                .into_iter()
                .any(|side| side.step(cell, size).is_none_or(|next| board[next].is_wall()))
        });
        if hugs_wall {
            continue;
        }

        for cell in line {
            if cell != entry {
                board[cell] = Cell::Wall;
            }
        }
        lines += 1;
    }

    log::trace!("Carved {lines} wall lines in {attempts} attempts");
    lines
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn entry_is_never_walled() {
        for seed in 0..20 {
            let mut board = Board::new(13, (6, 6)).unwrap();
            let mut rng = SmallRng::seed_from_u64(seed);

            carve_walls(&mut board, &mut rng, 100);

            assert!(!board[(6, 6)].is_wall(), "seed {seed}");
        }
    }

    #[test]
    fn first_line_spans_the_board() {
        let mut board = Board::new(7, (0, 0)).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);

        assert_eq!(carve_walls(&mut board, &mut rng, 1), 1);

        let walls = board.iter().filter(|(_, cell)| cell.is_wall()).count();
        assert_eq!(walls, 7);
    }

    #[test]
    fn walls_never_come_two_thick() {
        let mut board = Board::new(13, (0, 0)).unwrap();
        let mut rng = SmallRng::seed_from_u64(11);

        carve_walls(&mut board, &mut rng, 100);

        // no 2x2 block of walls can form when lines never run alongside each other
        for row in 0..12 {
            for col in 0..12 {
                let block = [(row, col), (row + 1, col), (row, col + 1), (row + 1, col + 1)];
                assert!(
                    !block.iter().all(|&cell| board[cell].is_wall()),
                    "2x2 wall block at {:?}\n{board}",
                    (row, col)
                );
            }
        }
    }

    #[test]
    fn zero_attempts_leave_board_open() {
        let mut board = Board::new(9, (4, 4)).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);

        assert_eq!(carve_walls(&mut board, &mut rng, 0), 0);
        assert!(board.iter().all(|(_, cell)| cell.is_blank()));
    }
}
