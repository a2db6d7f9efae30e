//! Terminal playback script for a shared stream.
//!
//! The script is plain bash with no dependencies beyond `clear`, `cat`
//! and `sleep`, meant to be piped straight into a shell:
//! `curl -s <base>/api/terminal/<id> | bash`.

use super::session::StreamSession;

const DELIMITER_BASE: &str = "ASCII_FRAME_EOF";

/// Pause before playback starts so the banner can be read.
const BANNER_PAUSE_SECS: u32 = 2;

/// Render the playback script for `session`.
///
/// Output depends only on the session contents.
pub fn render_script(session: &StreamSession) -> String {
    let frames = session.frames();
    let delimiter = heredoc_delimiter(frames.iter().flat_map(|f| f.rows()));

    let mut script = String::with_capacity(
        frames.iter().map(|f| f.as_str().len() + 64).sum::<usize>() + 256,
    );

    script.push_str("#!/bin/bash\n");
    script.push_str("clear\n");
    script.push_str(&format!(
        "echo {}\n",
        shell_quote(&format!("Playing: {}", session.title()))
    ));
    script.push_str(&format!(
        "echo 'Frames: {} | FPS: {}'\n",
        frames.len(),
        session.frame_rate()
    ));
    script.push_str("echo 'Press Ctrl+C to stop'\n");
    script.push_str("echo \"\"\n");
    script.push_str(&format!("sleep {}\n", BANNER_PAUSE_SECS));
    script.push('\n');
    script.push_str(&format!("frame_delay={}\n", frame_delay(session.frame_rate())));
    script.push('\n');
    script.push_str("while true; do\n");

    for frame in frames {
        script.push_str("  clear\n");
        script.push_str(&format!("  cat << '{}'\n", delimiter));
        for row in frame.rows() {
            script.push_str(row);
            script.push('\n');
        }
        script.push_str(&delimiter);
        script.push('\n');
        script.push_str("  sleep $frame_delay\n");
    }

    script.push_str("done\n");
    script
}

/// Seconds per frame with three decimals, e.g. `0.042` for 24 fps.
fn frame_delay(frame_rate: f64) -> String {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        format!("{:.3}", 1.0 / frame_rate)
    } else {
        "0.000".to_string()
    }
}

/// Quote `value` as a single bash word.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// A heredoc terminator that no frame line equals.
fn heredoc_delimiter<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let lines: Vec<&str> = lines.collect();
    let mut delimiter = DELIMITER_BASE.to_string();
    while lines.iter().any(|line| *line == delimiter) {
        delimiter.push('_');
    }
    delimiter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::{FrameSequence, TextFrame};
    use crate::stream::session::StreamId;
    use tokio::time::Instant;

    fn session(frames: &[&str], rate: f64, title: &str) -> StreamSession {
        let frames = frames.iter().map(|f| TextFrame::from(*f)).collect();
        StreamSession::new(
            StreamId::generate(),
            FrameSequence::new(frames, rate, title),
            Instant::now(),
        )
    }

    #[test]
    fn test_script_layout() {
        let script = render_script(&session(&["AB\nCD", "EF\nGH"], 24.0, "Demo"));

        let expected = "#!/bin/bash\n\
clear\n\
echo 'Playing: Demo'\n\
echo 'Frames: 2 | FPS: 24'\n\
echo 'Press Ctrl+C to stop'\n\
echo \"\"\n\
sleep 2\n\
\n\
frame_delay=0.042\n\
\n\
while true; do\n  \
clear\n  \
cat << 'ASCII_FRAME_EOF'\n\
AB\n\
CD\n\
ASCII_FRAME_EOF\n  \
sleep $frame_delay\n  \
clear\n  \
cat << 'ASCII_FRAME_EOF'\n\
EF\n\
GH\n\
ASCII_FRAME_EOF\n  \
sleep $frame_delay\n\
done\n";
        assert_eq!(script, expected);
    }

    #[test]
    fn test_title_is_quoted() {
        let script = render_script(&session(&["x"], 10.0, "it's $(rm -rf ~)"));
        assert!(script.contains(r"echo 'Playing: it'\''s $(rm -rf ~)'"));
    }

    #[test]
    fn test_delimiter_avoids_frame_lines() {
        let script = render_script(&session(&["ASCII_FRAME_EOF\nok"], 10.0, "t"));
        assert!(script.contains("cat << 'ASCII_FRAME_EOF_'\n"));
        assert!(script.contains("\nASCII_FRAME_EOF_\n"));
    }

    #[test]
    fn test_fractional_rate() {
        let script = render_script(&session(&["x"], 12.5, "t"));
        assert!(script.contains("FPS: 12.5'"));
        assert!(script.contains("frame_delay=0.080\n"));
    }

    #[test]
    fn test_deterministic() {
        let s = session(&["a\nb", "c\nd"], 15.0, "same");
        assert_eq!(render_script(&s), render_script(&s));
    }
}
