use std::ffi::{c_void, CString};
use std::os::raw::{c_char, c_float, c_int};
use std::path::Path;
use std::time::Duration;

use libloading::Library;

use super::{BackendError, CubeBackend};
use crate::cube::{scramble, Cube, Move};
use crate::entities::{vertex_capacity, Vertex, VERTEX_FLOATS};

/// `createCube` takes a C `int` seed: keep the low bits, non-negative.
fn native_seed(seed: u64) -> c_int {
    (seed % (c_int::MAX as u64 + 1)) as c_int
}

type CreateCube = unsafe extern "C" fn(c_int, c_int) -> *mut c_void;
type MakeMove = unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int;
type ResetCube = unsafe extern "C" fn(*mut c_void);
type DestroyCube = unsafe extern "C" fn(*mut c_void);
type GetVertexData = unsafe extern "C" fn(*mut c_void, *mut c_float, c_int) -> c_int;

/// Cube state held by a dynamically loaded library. A local `Cube`
/// mirrors every accepted move to answer what the C interface cannot.
pub struct NativeBackend {
    handle: *mut c_void,
    make_move: MakeMove,
    reset_cube: ResetCube,
    destroy_cube: DestroyCube,
    get_vertex_data: GetVertexData,
    shadow: Cube,
    buffer: Vec<c_float>,
    // Must outlive the function pointers above.
    _library: Library,
}

impl NativeBackend {
    pub fn load(path: &Path, size: usize, seed: u64) -> Result<Self, BackendError> {
        let shadow = Cube::new(size)?;

        let library = unsafe { Library::new(path) }.map_err(|source| BackendError::Load {
            path: path.display().to_string(),
            source,
        })?;

        unsafe {
            let create_cube: CreateCube = symbol(&library, "createCube")?;
            let make_move: MakeMove = symbol(&library, "makeMove")?;
            let reset_cube: ResetCube = symbol(&library, "resetCube")?;
            let destroy_cube: DestroyCube = symbol(&library, "destroyCube")?;
            let get_vertex_data: GetVertexData = symbol(&library, "getVertexData")?;

            let c_seed = native_seed(seed);
            log::info!("native cube created with seed {}", c_seed);
            let handle = create_cube(size as c_int, c_seed);
            if handle.is_null() {
                return Err(BackendError::NullHandle);
            }

            Ok(Self {
                handle,
                make_move,
                reset_cube,
                destroy_cube,
                get_vertex_data,
                shadow,
                buffer: vec![0.0; vertex_capacity(size) * VERTEX_FLOATS],
                _library: library,
            })
        }
    }

    fn send(&mut self, mv: &Move) -> Result<(), BackendError> {
        let token = CString::new(mv.to_string()).map_err(|_| BackendError::Rejected {
            mv: mv.to_string(),
            code: -1,
        })?;
        let code = unsafe { (self.make_move)(self.handle, token.as_ptr()) };
        if code != 0 {
            return Err(BackendError::Rejected {
                mv: mv.to_string(),
                code,
            });
        }
        Ok(())
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, BackendError> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    library
        .get::<T>(&bytes)
        .map(|sym| *sym)
        .map_err(|source| BackendError::MissingSymbol { name, source })
}

impl CubeBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn size(&self) -> usize {
        self.shadow.size()
    }

    fn queue(&mut self, mv: Move) -> Result<(), BackendError> {
        self.shadow.layer_members(&mv)?;
        self.send(&mv)?;
        self.shadow.apply(mv)?;
        Ok(())
    }

    fn apply_now(&mut self, moves: &[Move]) -> Result<(), BackendError> {
        for mv in moves {
            self.queue(*mv)?;
        }
        Ok(())
    }

    // The library animates on its own clock.
    fn update(&mut self, _dt: Duration) {}

    fn vertices(&mut self) -> Vec<Vertex> {
        let capacity = self.buffer.len() as c_int;
        let written = unsafe { (self.get_vertex_data)(self.handle, self.buffer.as_mut_ptr(), capacity) };
        let written = (written.max(0) as usize).min(self.buffer.len());

        self.buffer[..written]
            .chunks_exact(VERTEX_FLOATS)
            .filter_map(Vertex::from_floats)
            .collect()
    }

    fn reset(&mut self) {
        unsafe { (self.reset_cube)(self.handle) };
        self.shadow.reset();
    }

    fn undo(&mut self) -> Option<Move> {
        let last = *self.shadow.history().last()?;
        match self.send(&last.inverse()) {
            Ok(()) => self.shadow.undo(),
            Err(err) => {
                log::warn!("undo failed: {}", err);
                None
            }
        }
    }

    fn scramble(&mut self, length: usize, seed: u64) -> Result<Vec<Move>, BackendError> {
        let moves = scramble(self.shadow.size(), length, seed);
        self.apply_now(&moves)?;
        Ok(moves)
    }

    fn facelets(&self) -> String {
        self.shadow.facelets()
    }

    fn is_solved(&self) -> bool {
        self.shadow.is_solved()
    }

    fn history(&self) -> Vec<Move> {
        self.shadow.history().to_vec()
    }

    fn is_idle(&self) -> bool {
        true
    }
}

impl Drop for NativeBackend {
    fn drop(&mut self) {
        unsafe { (self.destroy_cube)(self.handle) };
        log::debug!("destroyed native cube");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_fits_a_c_int() {
        assert_eq!(native_seed(42), 42);
        assert_eq!(native_seed(c_int::MAX as u64), c_int::MAX);
        assert_eq!(native_seed(c_int::MAX as u64 + 1), 0);
        assert!(native_seed(u64::MAX) >= 0);
    }

    #[test]
    fn missing_library_is_a_load_error() {
        let err = NativeBackend::load(Path::new("/nonexistent/libRubik.so"), 3, 1).err();
        assert!(matches!(err, Some(BackendError::Load { .. })));
    }
}
