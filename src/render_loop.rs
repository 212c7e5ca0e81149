use crate::console_display::FrameSink;
use crate::export;
use crate::input::{apply_view_command, Action};
use crate::renderer::{Renderer, Tick};
use crossbeam_channel::{never, select, tick, Receiver};
use log::{error, info};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Timer-driven UI loop: redraws on every tick and carries out the actions
/// the keyboard thread forwards (exports, quit).
///
/// Runs on the calling thread until the context is shut down, the run time
/// limit passes, or the sink fails. On exit the context is always shut
/// down so the other threads follow.
pub struct RenderLoop<K: FrameSink> {
    renderer: Renderer,
    sink: K,
    actions: Receiver<Action>,
    interval: Duration,
    output_dir: PathBuf,
    deadline: Option<Instant>,
}

impl<K: FrameSink> RenderLoop<K> {
    pub fn new(renderer: Renderer, sink: K, actions: Receiver<Action>, interval: Duration) -> Self {
        Self {
            renderer,
            sink,
            actions,
            interval,
            output_dir: PathBuf::from("."),
            deadline: None,
        }
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn with_run_time(mut self, limit: Option<Duration>) -> Self {
        self.deadline = limit.map(|d| Instant::now() + d);
        self
    }

    /// Returns the number of frames drawn.
    pub fn run(self) -> io::Result<u64> {
        let RenderLoop {
            mut renderer,
            mut sink,
            actions,
            interval,
            output_dir,
            deadline,
        } = self;
        let ctx = renderer.context().clone();
        let ticker = tick(interval);
        let idle = never();
        let mut keyboard_gone = false;
        let mut frames: u64 = 0;

        let result = 'render: loop {
            if !ctx.is_running() {
                break 'render Ok(frames);
            }
            let keys = if keyboard_gone { &idle } else { &actions };
            select! {
                recv(keys) -> msg => match msg {
                    Ok(action) => handle_action(&renderer, &output_dir, action),
                    // Keyboard thread is gone; keep ticking without it.
                    Err(_) => keyboard_gone = true,
                },
                recv(ticker) -> _ => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        info!("Run time limit reached");
                        break 'render Ok(frames);
                    }
                    let outcome = renderer.tick();
                    if outcome == Tick::Held && !sink.redraw_when_held() {
                        continue 'render;
                    }
                    let view = ctx.view.snapshot();
                    if let Err(e) = sink.draw(renderer.frame(), &view) {
                        break 'render Err(e);
                    }
                    frames += 1;
                },
            }
        };

        ctx.shutdown();
        result
    }
}

fn handle_action(renderer: &Renderer, output_dir: &Path, action: Action) {
    let ctx = renderer.context();
    match action {
        Action::View(cmd) => apply_view_command(ctx, cmd),
        Action::ExportCsv => {
            if let Err(e) = export::export_csv(&ctx.buffers, output_dir) {
                error!("CSV export failed: {}", e);
            }
        }
        Action::SavePng => {
            if let Err(e) = export::export_png(renderer.frame(), output_dir) {
                error!("Image export failed: {}", e);
            }
        }
        Action::Quit => {
            info!("Quit requested");
            ctx.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScopeContext;
    use crate::types::{RenderFrame, Sample};
    use crate::view_state::{ViewCommand, ViewSnapshot};
    use crossbeam_channel::unbounded;
    use std::sync::Arc;

    /// Records every drawn frame.
    #[derive(Default)]
    struct Recorder {
        frames: Vec<RenderFrame>,
        fail_after: Option<usize>,
    }

    impl FrameSink for &mut Recorder {
        fn draw(&mut self, frame: &RenderFrame, _view: &ViewSnapshot) -> io::Result<()> {
            if self.fail_after == Some(self.frames.len()) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"));
            }
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    #[test]
    fn test_runs_until_quit_action() {
        let ctx = Arc::new(ScopeContext::default());
        ctx.buffers.append(Sample::new(7, 8));
        let (tx, rx) = unbounded();
        let mut rec = Recorder::default();

        tx.send(Action::View(ViewCommand::NarrowWindow)).unwrap();
        tx.send(Action::Quit).unwrap();
        let lp = RenderLoop::new(
            Renderer::new(Arc::clone(&ctx)),
            &mut rec,
            rx,
            Duration::from_millis(1),
        );
        lp.run().unwrap();

        assert!(!ctx.is_running());
        assert_eq!(ctx.view.window_width(), 150);
        for f in &rec.frames {
            assert_eq!(f.latest(), Some(Sample::new(7, 8)));
        }
    }

    #[test]
    fn test_run_time_limit_and_disconnected_keyboard() {
        let ctx = Arc::new(ScopeContext::default());
        let (tx, rx) = unbounded::<Action>();
        drop(tx);
        let mut rec = Recorder::default();
        let drawn = RenderLoop::new(
            Renderer::new(Arc::clone(&ctx)),
            &mut rec,
            rx,
            Duration::from_millis(2),
        )
        .with_run_time(Some(Duration::from_millis(60)))
        .run()
        .unwrap();

        assert!(drawn > 0);
        assert_eq!(drawn as usize, rec.frames.len());
        assert!(!ctx.is_running());
    }

    #[test]
    fn test_sink_failure_stops_everything() {
        let ctx = Arc::new(ScopeContext::default());
        let (_tx, rx) = unbounded::<Action>();
        let mut rec = Recorder {
            fail_after: Some(3),
            ..Default::default()
        };
        let err = RenderLoop::new(
            Renderer::new(Arc::clone(&ctx)),
            &mut rec,
            rx,
            Duration::from_millis(1),
        )
        .run()
        .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(rec.frames.len(), 3);
        assert!(!ctx.is_running());
    }

    #[test]
    fn test_export_actions_write_files() {
        let ctx = Arc::new(ScopeContext::default());
        ctx.buffers.append(Sample::new(1, 2));
        let dir = std::env::temp_dir().join(format!("adc-scope-loop-{}", std::process::id()));
        let (tx, rx) = unbounded();
        let mut rec = Recorder::default();
        let lp = RenderLoop::new(
            Renderer::new(Arc::clone(&ctx)),
            &mut rec,
            rx,
            Duration::from_millis(1),
        )
        .with_output_dir(dir.clone())
        .with_run_time(Some(Duration::from_millis(500)));

        let sender = std::thread::spawn(move || {
            // Let a frame render first so there is a plot to save.
            std::thread::sleep(Duration::from_millis(50));
            tx.send(Action::ExportCsv).unwrap();
            tx.send(Action::SavePng).unwrap();
            tx.send(Action::Quit).unwrap();
        });
        lp.run().unwrap();
        sender.join().unwrap();

        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2, "{:?}", names);
        assert!(names[0].ends_with(".csv"));
        assert!(names[1].ends_with(".png"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    /// Writer the test can read while the loop still owns the sink.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<std::sync::Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes).lines().map(String::from).collect()
        }
    }

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_lines_skip_paused_ticks() {
        use crate::console_display::JsonLinesSink;
        use std::thread;

        let ctx = Arc::new(ScopeContext::default());
        ctx.buffers.append(Sample::new(1, 2));
        let out = SharedBuf::default();
        let (tx, rx) = unbounded();
        let lp = RenderLoop::new(
            Renderer::new(Arc::clone(&ctx)),
            JsonLinesSink::new(out.clone()),
            rx,
            Duration::from_millis(1),
        )
        .with_run_time(Some(Duration::from_secs(5)));

        let driver = {
            let ctx = Arc::clone(&ctx);
            let out = out.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                ctx.view.apply(ViewCommand::TogglePause);
                // Let a tick already in flight finish.
                thread::sleep(Duration::from_millis(20));
                let at_pause = out.lines().len();
                thread::sleep(Duration::from_millis(50));
                let still_paused = out.lines().len();

                ctx.buffers.append(Sample::new(9, 9));
                ctx.view.apply(ViewCommand::TogglePause);
                thread::sleep(Duration::from_millis(30));
                tx.send(Action::Quit).unwrap();
                (at_pause, still_paused)
            })
        };
        lp.run().unwrap();
        let (at_pause, still_paused) = driver.join().unwrap();

        assert!(at_pause > 0);
        assert_eq!(at_pause, still_paused);
        let lines = out.lines();
        assert!(lines.len() > still_paused);
        let last: RenderFrame = serde_json::from_str(lines.last().unwrap()).unwrap();
        assert_eq!(last.latest(), Some(Sample::new(9, 9)));
    }
}
