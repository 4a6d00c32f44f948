//! Terminal presentation of the logical frame
use crate::graphics::{Frame, Rgba};
use crate::render::Label;
use crossterm::{
    cursor,
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Colors, Print, ResetColor, SetColors},
    terminal::{self, ClearType},
};
use log::{debug, warn};
use std::io::{self, BufWriter, Stdout, Write};

/// Upper half block: foreground paints the top sample, background the bottom
const HALF_BLOCK: char = '\u{2580}';

/// How terminal cells map onto the logical surface. The last row is kept
/// for the status line; every other cell shows two vertically stacked
/// samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub surface_width: usize,
    pub surface_height: usize,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16, surface_width: usize, surface_height: usize) -> Self {
        Viewport {
            cols,
            rows,
            surface_width,
            surface_height,
        }
    }

    /// Rows of cells used for the image
    pub fn image_rows(&self) -> u16 {
        self.rows.saturating_sub(1)
    }

    /// Number of vertical samples (two per image row)
    fn samples_high(&self) -> usize {
        self.image_rows() as usize * 2
    }

    /// Surface position under the centre of a cell
    pub fn cell_to_surface(&self, col: u16, row: u16) -> (f64, f64) {
        let x = (col as f64 + 0.5) * self.surface_width as f64 / self.cols.max(1) as f64;
        let y = (row as f64 + 0.5) * self.surface_height as f64 / self.image_rows().max(1) as f64;
        (x, y)
    }

    /// Cell covering a surface position, if it is on the image
    pub fn surface_to_cell(&self, (x, y): (i32, i32)) -> Option<(u16, u16)> {
        if self.cols == 0
            || x < 0
            || y < 0
            || x as usize >= self.surface_width
            || y as usize >= self.surface_height
        {
            return None;
        }
        let col = x as usize * self.cols as usize / self.surface_width;
        let row = y as usize * self.image_rows() as usize / self.surface_height;
        if row >= self.image_rows() as usize {
            return None;
        }
        Some((col as u16, row as u16))
    }

    /// Picks the colour for one sample: the pixel in its block that stands
    /// out most from `background`, so thin lines survive downscaling.
    pub fn sample(&self, frame: &Frame, col: u16, sub_row: usize, background: Rgba) -> Rgba {
        let cols = self.cols.max(1) as usize;
        let high = self.samples_high().max(1);
        let x0 = col as usize * frame.width() / cols;
        let x1 = ((col as usize + 1) * frame.width() / cols).max(x0 + 1);
        let y0 = sub_row * frame.height() / high;
        let y1 = ((sub_row + 1) * frame.height() / high).max(y0 + 1);

        let mut best = background;
        let mut best_distance = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(p) = frame.pixel(x, y) {
                    let d = p.distance(background);
                    if d > best_distance {
                        best = p;
                        best_distance = d;
                    }
                }
            }
        }
        best
    }
}

fn to_color(c: Rgba) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Raw-mode alternate-screen terminal with mouse capture. Dropping it
/// restores the terminal.
pub struct TerminalSurface {
    out: BufWriter<Stdout>,
    viewport: Viewport,
    key_release_events: bool,
    /// Colours currently on screen per image cell; `None` forces a redraw
    shown: Vec<Option<(Rgba, Rgba)>>,
}

impl TerminalSurface {
    pub fn open(surface_width: usize, surface_height: usize) -> io::Result<Self> {
        let (cols, rows) = match termsize::get() {
            Some(size) => (size.cols, size.rows),
            None => terminal::size()?,
        };

        terminal::enable_raw_mode()?;
        let mut out = BufWriter::with_capacity(1 << 16, io::stdout());
        if let Err(e) = execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        ) {
            // Any of the three may have taken effect before the failure
            for failure in restore(&mut out, false, terminal::disable_raw_mode) {
                warn!("failed to restore terminal: {failure}");
            }
            return Err(e);
        }

        let key_release_events = matches!(terminal::supports_keyboard_enhancement(), Ok(true))
            && execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        debug!("terminal {cols}x{rows}, key release events: {key_release_events}");

        Ok(TerminalSurface {
            out,
            viewport: Viewport::new(cols, rows, surface_width, surface_height),
            key_release_events,
            shown: Vec::new(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Whether the terminal reports key releases, so held keys can be
    /// tracked exactly
    pub fn reports_key_release(&self) -> bool {
        self.key_release_events
    }

    pub fn resize(&mut self, cols: u16, rows: u16) -> io::Result<()> {
        self.viewport.cols = cols;
        self.viewport.rows = rows;
        self.shown.clear();
        queue!(self.out, ResetColor, terminal::Clear(ClearType::All))
    }

    /// Draws the frame, the labels over it, overlay text in the top-left
    /// corner and the status line, then flushes.
    pub fn present(
        &mut self,
        frame: &Frame,
        background: Rgba,
        labels: &[Label],
        overlay: &[String],
        status: &str,
    ) -> io::Result<()> {
        let viewport = self.viewport;
        let cols = viewport.cols as usize;
        let cells = cols * viewport.image_rows() as usize;
        if self.shown.len() != cells {
            self.shown = vec![None; cells];
        }
        let mut current: Option<(Rgba, Rgba)> = None;

        for row in 0..viewport.image_rows() {
            // Unchanged cells are skipped, so the cursor is repositioned
            // whenever the next changed cell does not follow the last write
            let mut cursor_at: Option<u16> = None;
            for col in 0..viewport.cols {
                let top = viewport.sample(frame, col, row as usize * 2, background);
                let bottom = viewport.sample(frame, col, row as usize * 2 + 1, background);
                let index = row as usize * cols + col as usize;
                if self.shown[index] == Some((top, bottom)) {
                    continue;
                }
                if cursor_at != Some(col) {
                    queue!(self.out, cursor::MoveTo(col, row))?;
                }
                if current != Some((top, bottom)) {
                    queue!(self.out, SetColors(Colors::new(to_color(top), to_color(bottom))))?;
                    current = Some((top, bottom));
                }
                queue!(self.out, Print(HALF_BLOCK))?;
                self.shown[index] = Some((top, bottom));
                cursor_at = Some(col + 1);
            }
        }

        for label in labels {
            if let Some((col, row)) = viewport.surface_to_cell(label.position) {
                let under = viewport.sample(frame, col, row as usize * 2 + 1, background);
                queue!(
                    self.out,
                    cursor::MoveTo(col, row),
                    SetColors(Colors::new(to_color(label.color), to_color(under))),
                    Print(label.text)
                )?;
                self.shown[row as usize * cols + col as usize] = None;
            }
        }

        queue!(self.out, ResetColor)?;
        for (row, line) in overlay.iter().enumerate().take(viewport.image_rows() as usize) {
            let text: String = line.chars().take(cols).collect();
            for cell in &mut self.shown[row * cols..row * cols + text.chars().count()] {
                *cell = None;
            }
            queue!(self.out, cursor::MoveTo(0, row as u16), Print(text))?;
        }

        if viewport.rows > 0 {
            let text: String = status.chars().take(cols).collect();
            queue!(
                self.out,
                cursor::MoveTo(0, viewport.rows - 1),
                terminal::Clear(ClearType::CurrentLine),
                Print(text)
            )?;
        }

        self.out.flush()
    }
}

/// Undoes what `open` set up. Every step is attempted even when an earlier
/// one fails; the failures are returned.
fn restore<W: Write>(
    out: &mut W,
    pop_keyboard_flags: bool,
    disable_raw_mode: impl FnOnce() -> io::Result<()>,
) -> Vec<io::Error> {
    let mut failures = Vec::new();
    if pop_keyboard_flags {
        if let Err(e) = execute!(out, PopKeyboardEnhancementFlags) {
            failures.push(e);
        }
    }
    if let Err(e) = execute!(
        out,
        ResetColor,
        DisableMouseCapture,
        cursor::Show,
        terminal::LeaveAlternateScreen
    ) {
        failures.push(e);
    }
    // Writes nothing, so it still works with a broken stdout
    if let Err(e) = disable_raw_mode() {
        failures.push(e);
    }
    failures
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let failures = restore(
            &mut self.out,
            self.key_release_events,
            terminal::disable_raw_mode,
        );
        for failure in failures {
            warn!("failed to restore terminal: {failure}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_mapping() {
        // 100 columns and 50 image rows over an 800x600 surface
        let viewport = Viewport::new(100, 51, 800, 600);
        assert_eq!(viewport.image_rows(), 50);
        assert_eq!(viewport.cell_to_surface(0, 0), (4.0, 6.0));
        assert_eq!(viewport.cell_to_surface(99, 49), (796.0, 594.0));
        assert_eq!(viewport.surface_to_cell((4, 6)), Some((0, 0)));
        assert_eq!(viewport.surface_to_cell((799, 599)), Some((99, 49)));
        assert_eq!(viewport.surface_to_cell((800, 10)), None);
        assert_eq!(viewport.surface_to_cell((-1, 10)), None);
    }

    #[test]
    fn test_cell_centres_round_trip() {
        let viewport = Viewport::new(87, 33, 800, 600);
        for col in [0, 10, 43, 86] {
            for row in [0, 7, 31] {
                let (x, y) = viewport.cell_to_surface(col, row);
                assert_eq!(viewport.surface_to_cell((x as i32, y as i32)), Some((col, row)));
            }
        }
    }

    #[test]
    fn test_sample_keeps_thin_lines() {
        let mut frame = Frame::new(800, 600);
        frame.draw_line((0, 301), (799, 301), Rgba::WHITE, 1);
        // 50 image rows -> 100 samples of 6 pixels each; row 301 is in sample 50
        let viewport = Viewport::new(100, 51, 800, 600);
        assert_eq!(viewport.sample(&frame, 10, 50, Rgba::BLACK), Rgba::WHITE);
        assert_eq!(viewport.sample(&frame, 10, 49, Rgba::BLACK), Rgba::BLACK);
    }

    /// Output that fails every write, like a closed pipe
    struct BrokenOutput;

    impl Write for BrokenOutput {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_restore_leaves_alternate_screen() {
        let mut out = Vec::new();
        let failures = restore(&mut out, false, || Ok(()));
        assert!(failures.is_empty());
        let written = String::from_utf8_lossy(&out);
        assert!(written.contains("\x1b[?25h"));
        assert!(written.contains("\x1b[?1049l"));
    }

    #[test]
    fn test_restore_disables_raw_mode_after_write_failure() {
        let mut raw_mode_disabled = false;
        let failures = restore(&mut BrokenOutput, true, || {
            raw_mode_disabled = true;
            Ok(())
        });
        assert!(raw_mode_disabled);
        // Popping the keyboard flags and resetting the screen both failed
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn test_tiny_terminal() {
        let viewport = Viewport::new(1, 1, 800, 600);
        assert_eq!(viewport.image_rows(), 0);
        assert_eq!(viewport.surface_to_cell((10, 10)), None);
        let frame = Frame::new(800, 600);
        assert_eq!(viewport.sample(&frame, 0, 0, Rgba::BLACK), Rgba::BLACK);
    }
}
