//! Local terminal playback of a frame sequence.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};

use crate::ascii::FrameSequence;

/// Longest sleep between checks of the stop flag.
const STOP_POLL: Duration = Duration::from_millis(50);

/// Play `sequence` on stdout. See [`play_to`].
pub fn play(sequence: &FrameSequence, loops: usize, stop: &AtomicBool) -> io::Result<usize> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    play_to(&mut out, sequence, loops, stop)
}

/// Play `sequence` on `out` at its frame rate, clearing between frames.
///
/// Runs `loops` passes over the frames (0 loops forever) or until `stop` is
/// set, and returns the number of frames drawn. The cursor is hidden while
/// playing and shown again afterwards, also when drawing fails.
pub fn play_to<W: Write>(
    out: &mut W,
    sequence: &FrameSequence,
    loops: usize,
    stop: &AtomicBool,
) -> io::Result<usize> {
    if sequence.is_empty() {
        return Ok(0);
    }

    queue!(out, Hide)?;
    let result = play_frames(out, sequence, loops, stop);
    let restored = execute!(out, Show);

    let shown = result?;
    restored?;
    Ok(shown)
}

fn play_frames<W: Write>(
    out: &mut W,
    sequence: &FrameSequence,
    loops: usize,
    stop: &AtomicBool,
) -> io::Result<usize> {
    let delay = sequence.frame_delay();
    let mut shown = 0;
    let mut passes = 0;

    'playback: loop {
        for frame in &sequence.frames {
            if stop.load(Ordering::SeqCst) {
                break 'playback;
            }

            let started = Instant::now();
            queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
            for (i, row) in frame.rows().enumerate() {
                if i > 0 {
                    // raw \n does not return the carriage in every terminal mode
                    queue!(out, Print("\r\n"))?;
                }
                queue!(out, Print(row))?;
            }
            out.flush()?;
            shown += 1;

            wait_for_next_frame(started, delay, stop);
        }

        passes += 1;
        if loops != 0 && passes >= loops {
            break;
        }
    }

    Ok(shown)
}

/// Sleep until `delay` has passed since `started`, waking every
/// [`STOP_POLL`] to check `stop`.
fn wait_for_next_frame(started: Instant, delay: Duration, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        let remaining = match delay.checked_sub(started.elapsed()) {
            Some(remaining) if !remaining.is_zero() => remaining,
            _ => return,
        };
        thread::sleep(remaining.min(STOP_POLL));
    }
}
