use crate::config::array_path_for;
use crate::io::raster::RasterHandle;
use crate::types::{PixelStack, RasterStack, SpectralError, SpectralResult};
use ndarray::{Array, ArrayBase, Data, Dimension};
use ndarray_npy::{read_npy, write_npy, ReadNpyError, ReadableElement, WritableElement};
use std::path::{Path, PathBuf};

/// Persists raster arrays as `.npy` files next to their source raster
pub struct ArrayStore;

impl ArrayStore {
    /// Persist an array under the path derived from `source_path`
    pub fn persist<A, S, D, P>(array: &ArrayBase<S, D>, source_path: P) -> SpectralResult<PathBuf>
    where
        A: WritableElement,
        S: Data<Elem = A>,
        D: Dimension,
        P: AsRef<Path>,
    {
        let output_path = array_path_for(source_path);
        Self::write_to(array, &output_path)?;
        Ok(output_path)
    }

    /// Persist a native-typed stack under the path derived from `source_path`
    pub fn persist_stack<P: AsRef<Path>>(stack: &RasterStack, source_path: P) -> SpectralResult<PathBuf> {
        let output_path = array_path_for(source_path);
        Self::write_stack_to(stack, &output_path)?;
        Ok(output_path)
    }

    /// Read every band of an open raster and persist it next to the raster
    pub fn persist_handle(handle: &RasterHandle) -> SpectralResult<PathBuf> {
        let stack = handle.read_stack()?;
        Self::persist_stack(&stack, handle.path())
    }

    /// Write an array to an explicit path
    pub fn write_to<A, S, D, P>(array: &ArrayBase<S, D>, path: P) -> SpectralResult<()>
    where
        A: WritableElement,
        S: Data<Elem = A>,
        D: Dimension,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        log::debug!("Writing array of shape {:?} to {}", array.shape(), path.display());
        write_npy(path, array)?;
        Ok(())
    }

    pub fn write_stack_to<P: AsRef<Path>>(stack: &RasterStack, path: P) -> SpectralResult<()> {
        log::debug!("Persisting {} stack {:?}", stack.dtype_name(), stack.dim());
        match stack {
            RasterStack::U8(a) => Self::write_to(a, path),
            RasterStack::U16(a) => Self::write_to(a, path),
            RasterStack::I16(a) => Self::write_to(a, path),
            RasterStack::U32(a) => Self::write_to(a, path),
            RasterStack::I32(a) => Self::write_to(a, path),
            RasterStack::F32(a) => Self::write_to(a, path),
            RasterStack::F64(a) => Self::write_to(a, path),
        }
    }

    /// Load a persisted array of known element type and dimensionality
    pub fn load<A, D, P>(path: P) -> SpectralResult<Array<A, D>>
    where
        A: ReadableElement,
        D: Dimension,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        Self::ensure_exists(path)?;
        let array: Array<A, D> = read_npy(path)?;
        log::debug!("Loaded array of shape {:?} from {}", array.shape(), path.display());
        Ok(array)
    }

    /// Load a persisted 3-D stack whose element type is discovered from the file
    pub fn load_stack<P: AsRef<Path>>(path: P) -> SpectralResult<RasterStack> {
        let path = path.as_ref();
        Self::ensure_exists(path)?;

        if let Some(a) = Self::try_load::<u8>(path)? {
            return Ok(RasterStack::U8(a));
        }
        if let Some(a) = Self::try_load::<u16>(path)? {
            return Ok(RasterStack::U16(a));
        }
        if let Some(a) = Self::try_load::<i16>(path)? {
            return Ok(RasterStack::I16(a));
        }
        if let Some(a) = Self::try_load::<u32>(path)? {
            return Ok(RasterStack::U32(a));
        }
        if let Some(a) = Self::try_load::<i32>(path)? {
            return Ok(RasterStack::I32(a));
        }
        if let Some(a) = Self::try_load::<f32>(path)? {
            return Ok(RasterStack::F32(a));
        }
        if let Some(a) = Self::try_load::<f64>(path)? {
            return Ok(RasterStack::F64(a));
        }

        Err(SpectralError::Format(format!(
            "{} holds an unsupported element type",
            path.display()
        )))
    }

    /// `None` when the file's dtype differs from `A`
    fn try_load<A: ReadableElement>(path: &Path) -> SpectralResult<Option<PixelStack<A>>> {
        match read_npy::<_, PixelStack<A>>(path) {
            Ok(array) => Ok(Some(array)),
            Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_exists(path: &Path) -> SpectralResult<()> {
        if path.is_file() {
            Ok(())
        } else {
            Err(SpectralError::NotFound(format!(
                "Persisted array not found: {}",
                path.display()
            )))
        }
    }
}
