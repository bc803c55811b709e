//! 终端棋盘渲染
//!
//! 渲染层只消费状态机的只读快照，不反向触碰任何对局状态。
//! `--size` 沿用原 CLI 的窗口尺寸参数：钳到最小值后只决定紧凑/宽松
//! 两种格子宽度。

use shakmaty::{File, Position, Rank, Square};

use crate::game::{GameOutcome, Phase, Snapshot};

/// 尺寸下限，低于此值按此值处理
const MIN_BOARD_SIZE: u32 = 200;

/// 达到此尺寸使用宽格子
const WIDE_THRESHOLD: u32 = 400;

/// ASCII 棋盘渲染器
pub struct BoardRenderer {
    wide: bool,
}

impl BoardRenderer {
    pub fn new(size: u32) -> Self {
        let size = size.max(MIN_BOARD_SIZE);
        Self {
            wide: size >= WIDE_THRESHOLD,
        }
    }

    /// 渲染快照为多行文本
    ///
    /// 最近一步的起止格标 `*`，被将军的王标 `+`，连接方视角翻转。
    pub fn render(&self, snap: &Snapshot) -> String {
        let mut out = String::new();

        let mut ranks: Vec<Rank> = Rank::ALL.to_vec();
        let mut files: Vec<File> = File::ALL.to_vec();
        if snap.flipped {
            files.reverse();
        } else {
            ranks.reverse();
        }

        out.push_str(&self.files_header(&files));
        for rank in ranks {
            out.push(rank.char());
            out.push(' ');
            for &file in &files {
                let sq = Square::from_coords(file, rank);
                let piece = snap
                    .position
                    .board()
                    .piece_at(sq)
                    .map(|p| p.char())
                    .unwrap_or('.');
                out.push(self.marker(snap, sq));
                out.push(piece);
                if self.wide {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out.push_str(&self.files_header(&files));

        out.push_str(&status_line(snap));
        out.push('\n');
        out
    }

    fn files_header(&self, files: &[File]) -> String {
        let mut line = String::from(" ");
        for &file in files {
            line.push(' ');
            line.push(file.char());
            if self.wide {
                line.push(' ');
            }
        }
        line.push('\n');
        line
    }

    fn marker(&self, snap: &Snapshot, sq: Square) -> char {
        if snap.check == Some(sq) {
            '+'
        } else if snap
            .last_move
            .map(|m| m.from == sq || m.to == sq)
            .unwrap_or(false)
        {
            '*'
        } else {
            ' '
        }
    }
}

fn status_line(snap: &Snapshot) -> String {
    match (snap.outcome, snap.phase) {
        (Some(GameOutcome::Checkmate { winner }), _) => {
            let side = if winner.is_white() { "White" } else { "Black" };
            format!("Checkmate! {} wins!", side)
        }
        (None, Phase::AwaitingLocalMove) => {
            if snap.check.is_some() {
                "Check! Your move.".to_string()
            } else {
                "Your move.".to_string()
            }
        }
        (None, Phase::AwaitingRemoteMove) => "Waiting for opponent...".to_string(),
        (None, Phase::GameOver) => "Game over.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use protocol::PeerRole;

    #[test]
    fn test_render_standard_host_view() {
        let game = Game::standard(PeerRole::Host);
        let text = BoardRenderer::new(200).render(&game.snapshot());

        let lines: Vec<&str> = text.lines().collect();
        // 白方视角：黑方底线在最上
        assert!(lines[1].starts_with("8"));
        assert!(lines[1].contains(" r n b q k b n r"));
        assert!(lines[8].starts_with("1"));
        assert!(lines[8].contains(" R N B Q K B N R"));
        assert!(text.contains("Your move."));
    }

    #[test]
    fn test_render_client_view_flipped() {
        let game = Game::standard(PeerRole::Client);
        let text = BoardRenderer::new(200).render(&game.snapshot());

        let lines: Vec<&str> = text.lines().collect();
        // 黑方视角：白方底线在最上，h 线在最左
        assert!(lines[0].trim_start().starts_with("h g f"));
        assert!(lines[1].starts_with("1"));
        assert!(text.contains("Waiting for opponent..."));
    }

    #[test]
    fn test_render_marks_last_move_and_mate() {
        let mut game = Game::standard(PeerRole::Host);
        use crate::game::MoveOrigin;
        game.apply_move("f2f3", MoveOrigin::Local).unwrap();
        game.apply_move("e7e5", MoveOrigin::Remote).unwrap();
        game.apply_move("g2g4", MoveOrigin::Local).unwrap();
        let snap = game.apply_move("d8h4", MoveOrigin::Remote).unwrap();

        let text = BoardRenderer::new(600).render(&snap);
        assert!(text.contains("Checkmate! Black wins!"));
        // 最近一步的皇后落点带标记
        assert!(text.contains("*q"));
        // 被将的白王带标记
        assert!(text.contains("+K"));
    }
}
