use std::fmt;
use std::fs;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use crate::compositing::{compose, encode_png};
use crate::config::SpriteOptions;
use crate::error::{Result, SpriteError};
use crate::inline::inline_raster;
use crate::loader::{self, LoadedImage};
use crate::model::{Pos, SpriteEntry, SpriteMap};
use crate::namer;
use crate::packer::{Packer, stack::StackPacker};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{BoxFuture, Shared};
use image::RgbaImage;
use parking_lot::{Mutex, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

/// The encoded sheet produced by one combine pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    pub width: u32,
    pub height: u32,
    /// PNG bytes.
    pub png: Vec<u8>,
}

/// Failure of a background combine pass. Kept cloneable so every waiter on
/// the shared future receives it.
#[derive(Debug, Clone)]
enum CombineFailure {
    Empty { width: u32, height: u32 },
    Encode(String),
    Worker(String),
}

impl From<CombineFailure> for SpriteError {
    fn from(f: CombineFailure) -> Self {
        match f {
            CombineFailure::Empty { width, height } => SpriteError::EmptySprite { width, height },
            CombineFailure::Encode(msg) => SpriteError::Encode(msg),
            CombineFailure::Worker(msg) => SpriteError::Encode(format!("combine worker: {msg}")),
        }
    }
}

type CombineOutput = std::result::Result<Arc<Composite>, CombineFailure>;

/// Completion handle of a combine pass.
///
/// Clones observe the same pass. Await it from async code, or call
/// [`CombineHandle::wait`] to block. Dropping a handle never cancels the pass.
#[derive(Clone)]
pub struct CombineHandle {
    inner: Shared<BoxFuture<'static, CombineOutput>>,
}

impl CombineHandle {
    fn ready(out: CombineOutput) -> Self {
        let inner = futures::future::ready(out).boxed().shared();
        // resolve eagerly so `peek` sees the result
        let _ = inner.clone().now_or_never();
        Self { inner }
    }

    /// Block the current thread until the composite is available.
    pub fn wait(self) -> Result<Arc<Composite>> {
        futures::executor::block_on(self)
    }

    /// True once the pass has finished, successfully or not.
    pub fn is_done(&self) -> bool {
        self.settled().is_some()
    }

    fn failed(&self) -> bool {
        matches!(self.settled(), Some(Err(_)))
    }

    /// Result of the pass if it has finished, without blocking.
    fn settled(&self) -> Option<CombineOutput> {
        match self.inner.peek() {
            Some(out) => Some(out.clone()),
            None => self.inner.clone().now_or_never(),
        }
    }
}

impl Future for CombineHandle {
    type Output = Result<Arc<Composite>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx).map(|r| r.map_err(SpriteError::from))
    }
}

impl fmt::Debug for CombineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombineHandle")
            .field("done", &self.is_done())
            .finish()
    }
}

#[derive(Default)]
struct PathTable {
    rel: Vec<String>,
    globs: Vec<PathBuf>,
}

#[derive(Default)]
struct CombineState {
    epoch: u64,
    pending: Option<CombineHandle>,
}

/// An ordered set of images stacked into one sheet.
///
/// Every piece of state sits behind its own lock so geometry reads never wait
/// on compositing:
/// - `images` and `paths` are read-mostly
/// - `output` memoizes the name for the current epoch
/// - `combined` holds the in-flight or finished combine pass
///
/// Locks are always taken in the order `output`, `combined`, `images`,
/// `paths`. `decode` holds all four while appending, so a new epoch and its
/// images become visible together and no pass is ever drawn for images that
/// are about to be invalidated.
pub struct Sprite {
    options: SpriteOptions,
    packer: StackPacker,
    images: RwLock<Vec<Arc<RgbaImage>>>,
    paths: RwLock<PathTable>,
    output: Mutex<Option<String>>,
    combined: RwLock<CombineState>,
    draws: Arc<AtomicUsize>,
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("options", &self.options)
            .field("images", &self.len())
            .field("epoch", &self.epoch())
            .finish()
    }
}

impl Sprite {
    pub fn new(options: SpriteOptions) -> Self {
        Self {
            packer: StackPacker::from_options(&options),
            options,
            images: RwLock::new(Vec::new()),
            paths: RwLock::new(PathTable::default()),
            output: Mutex::new(None),
            combined: RwLock::new(CombineState::default()),
            draws: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn options(&self) -> &SpriteOptions {
        &self.options
    }

    /// Resolve `patterns` under the image directory and append every match.
    ///
    /// Stops at the first failing file. Images decoded before the failure are
    /// kept, so callers that need all-or-nothing must snapshot beforehand.
    #[instrument(skip_all, fields(patterns = patterns.len()))]
    pub fn decode<S: AsRef<str>>(&self, patterns: &[S]) -> Result<()> {
        let mut loaded: Vec<LoadedImage> = Vec::new();
        let result = loader::load(&self.options.image_dir, patterns, &mut loaded);

        if !loaded.is_empty() {
            let count = loaded.len();
            let total = {
                let mut output = self.output.lock();
                let mut state = self.combined.write();
                let mut images = self.images.write();
                let mut paths = self.paths.write();
                for entry in loaded {
                    images.push(entry.image);
                    paths.rel.push(entry.rel);
                    paths.globs.push(entry.glob);
                }
                *output = None;
                state.epoch += 1;
                state.pending = None;
                images.len()
            };
            debug!(count, total, "images appended");
        }
        if let Err(e) = &result {
            warn!(error = %e, "decode failed");
        }
        result
    }

    /// Number of decoded images.
    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Incremented by every `decode` that appended images.
    pub fn epoch(&self) -> u64 {
        self.combined.read().epoch
    }

    /// Number of draw passes run so far. Diagnostic only.
    pub fn draw_count(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    /// Paths relative to the image directory, in packing order.
    pub fn paths(&self) -> Vec<String> {
        self.paths.read().rel.clone()
    }

    /// Paths as matched by the globs, in packing order.
    pub fn globs(&self) -> Vec<PathBuf> {
        self.paths.read().globs.clone()
    }

    fn sizes(&self) -> Vec<(u32, u32)> {
        self.images.read().iter().map(|i| i.dimensions()).collect()
    }

    /// Offset of image `index` in the sheet.
    ///
    /// `index == len()` yields the sheet extent (prefer [`Sprite::extent`]),
    /// `-1` yields the origin, anything else out of range yields `(-1, -1)`.
    pub fn position(&self, index: isize) -> Pos {
        self.packer.position(&self.sizes(), index)
    }

    /// Whole-sheet width and height.
    pub fn extent(&self) -> Pos {
        self.packer.extent(&self.sizes())
    }

    pub fn width(&self) -> i64 {
        self.extent().x
    }

    pub fn height(&self) -> i64 {
        self.extent().y
    }

    /// Width of image `index`, or -1 when out of range.
    pub fn image_width(&self, index: isize) -> i64 {
        self.image_dim(index).map(|(w, _)| w as i64).unwrap_or(-1)
    }

    /// Height of image `index`, or -1 when out of range.
    pub fn image_height(&self, index: isize) -> i64 {
        self.image_dim(index).map(|(_, h)| h as i64).unwrap_or(-1)
    }

    fn image_dim(&self, index: isize) -> Option<(u32, u32)> {
        let idx = usize::try_from(index).ok()?;
        self.images.read().get(idx).map(|i| i.dimensions())
    }

    /// Index of the image whose relative path equals `name`, or whose file
    /// name without extension equals it. The last match wins; -1 if none.
    pub fn lookup(&self, name: &str) -> isize {
        let images = self.images.read();
        let paths = self.paths.read();
        let mut pos: Option<usize> = None;
        for (i, rel) in paths.rel.iter().enumerate() {
            let base = Path::new(rel)
                .file_stem()
                .map(|s| s.to_string_lossy())
                .unwrap_or_default();
            if name == rel.as_str() || name == base {
                pos = Some(i);
            }
        }
        match pos {
            Some(i) if i < images.len() => i as isize,
            _ => -1,
        }
    }

    /// Relative path of the image `name` resolves to.
    pub fn file(&self, name: &str) -> Option<String> {
        let idx = usize::try_from(self.lookup(name)).ok()?;
        self.paths.read().rel.get(idx).cloned()
    }

    pub fn image_width_by_name(&self, name: &str) -> i64 {
        self.image_width(self.lookup(name))
    }

    pub fn image_height_by_name(&self, name: &str) -> i64 {
        self.image_height(self.lookup(name))
    }

    /// Start compositing the current images, or join the pass already running
    /// or finished for this epoch.
    ///
    /// The draw happens on a background thread against a snapshot of the image
    /// list; a `decode` arriving meanwhile starts a new epoch instead of
    /// altering this pass. Failed passes are not cached.
    pub fn combine(&self) -> CombineHandle {
        if let Some(handle) = self.cached_combine() {
            return handle;
        }
        let mut state = self.combined.write();
        if let Some(handle) = state.pending.as_ref().filter(|h| !h.failed()) {
            return handle.clone();
        }

        let images: Vec<Arc<RgbaImage>> = self.images.read().clone();
        let sizes: Vec<(u32, u32)> = images.iter().map(|i| i.dimensions()).collect();
        let positions: Vec<Pos> = (0..sizes.len())
            .map(|i| self.packer.position(&sizes, i as isize))
            .collect();
        let extent = self.packer.extent(&sizes);
        if extent.x <= 0 || extent.y <= 0 {
            return CombineHandle::ready(Err(CombineFailure::Empty {
                width: extent.x.max(0) as u32,
                height: extent.y.max(0) as u32,
            }));
        }

        let (tx, rx) = oneshot::channel::<CombineOutput>();
        let draws = Arc::clone(&self.draws);
        let epoch = state.epoch;
        let spawned = std::thread::Builder::new()
            .name("spritewell-combine".into())
            .spawn(move || {
                draws.fetch_add(1, Ordering::SeqCst);
                let out = draw(&images, &positions, extent);
                debug!(epoch, ok = out.is_ok(), "combine pass finished");
                let _ = tx.send(out);
            });
        if let Err(e) = spawned {
            return CombineHandle::ready(Err(CombineFailure::Worker(e.to_string())));
        }

        let handle = CombineHandle {
            inner: rx
                .map(|r| {
                    r.unwrap_or_else(|_| {
                        Err(CombineFailure::Worker("combine pass aborted".into()))
                    })
                })
                .boxed()
                .shared(),
        };
        state.pending = Some(handle.clone());
        handle
    }

    fn cached_combine(&self) -> Option<CombineHandle> {
        let state = self.combined.read();
        state.pending.as_ref().filter(|h| !h.failed()).cloned()
    }

    /// Block until the composite for the current epoch exists.
    pub fn wait(&self) -> Result<Arc<Composite>> {
        self.combine().wait()
    }

    /// Output name, `<dir>/<hash>.png`. Memoized until the next `decode`.
    pub fn output_path(&self) -> Result<String> {
        let mut output = self.output.lock();
        if let Some(name) = output.as_ref() {
            return Ok(name.clone());
        }
        let globs = self.paths.read().globs.clone();
        if globs.is_empty() {
            return Err(SpriteError::EmptySprite {
                width: 0,
                height: 0,
            });
        }
        let name = namer::output_name(&self.options, &globs);
        *output = Some(name.clone());
        Ok(name)
    }

    /// Write the sheet into the output directory and return its absolute path.
    ///
    /// Returns right away when a non-empty file already exists. An empty sprite
    /// fails before any file is created, and a failed write leaves nothing at
    /// the target.
    #[instrument(skip_all)]
    pub fn export(&self) -> Result<PathBuf> {
        let name = self.output_path()?;
        let file_name = Path::new(&name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&name));
        let target = self.options.gen_img_dir.join(file_name);
        let abs = std::path::absolute(&target).unwrap_or(target);
        if fs::metadata(&abs).is_ok_and(|m| m.is_file() && m.len() > 0) {
            debug!(path = %abs.display(), "sheet already exported");
            return Ok(abs);
        }

        let composite = self.wait()?;
        if composite.png.is_empty() {
            return Err(SpriteError::Encode("empty PNG buffer".into()));
        }
        // staged next to the target; a failed write never leaves a partial sheet
        let dir = abs.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SpriteError::io(dir, e))?;
        tmp.write_all(&composite.png)
            .map_err(|e| SpriteError::io(&abs, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(|e| SpriteError::io(&abs, e))?;
        }
        tmp.persist(&abs)
            .map_err(|e| SpriteError::io(&abs, e.error))?;
        info!(path = %abs.display(), bytes = composite.png.len(), "sheet exported");
        Ok(abs)
    }

    /// The composited sheet as a PNG data URI.
    pub fn inline(&self) -> Result<String> {
        Ok(inline_raster(&self.wait()?.png))
    }

    /// Name, path and geometry of every image plus the sheet size.
    pub fn sprite_map(&self) -> Result<SpriteMap> {
        let image = self.output_path()?;
        let images = self.images.read();
        let paths = self.paths.read();
        let sizes: Vec<(u32, u32)> = images.iter().map(|i| i.dimensions()).collect();
        let extent = self.packer.extent(&sizes);
        let entries = paths
            .rel
            .iter()
            .zip(&sizes)
            .enumerate()
            .map(|(i, (rel, &(w, h)))| {
                let pos = self.packer.position(&sizes, i as isize);
                SpriteEntry {
                    name: Path::new(rel)
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    path: rel.clone(),
                    x: pos.x,
                    y: pos.y,
                    width: w as i64,
                    height: h as i64,
                }
            })
            .collect();
        Ok(SpriteMap {
            image,
            width: extent.x,
            height: extent.y,
            entries,
        })
    }
}

fn draw(images: &[Arc<RgbaImage>], positions: &[Pos], extent: Pos) -> CombineOutput {
    let canvas = compose(images, positions, extent).map_err(|e| match e {
        SpriteError::EmptySprite { width, height } => CombineFailure::Empty { width, height },
        other => CombineFailure::Encode(other.to_string()),
    })?;
    let png = encode_png(&canvas).map_err(|e| CombineFailure::Encode(e.to_string()))?;
    Ok(Arc::new(Composite {
        width: canvas.width(),
        height: canvas.height(),
        png,
    }))
}
