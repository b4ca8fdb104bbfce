//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`NonVolatileStore`] for the one value that survives a power
//! cycle: the last LED state. The value is wrapped in [`PersistedState`]
//! and postcard-encoded into a single blob.
//!
//! - Namespace isolation: everything lives under the `tempsense` namespace.
//! - Atomic writes: ESP-IDF NVS commits are atomic per nvs_commit().
//! - The simulation backend keeps the blob in memory (dev/test only).

use log::info;
use serde::{Deserialize, Serialize};

#[cfg(not(target_os = "espidf"))]
use core::cell::RefCell;

#[cfg(not(target_os = "espidf"))]
use critical_section::Mutex;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::NonVolatileStore;
use crate::error::StorageError;

#[cfg(target_os = "espidf")]
const NAMESPACE: &core::ffi::CStr = c"tempsense";
#[cfg(target_os = "espidf")]
const LED_KEY: &core::ffi::CStr = c"led";

/// Upper bound of an encoded [`PersistedState`].
const MAX_BLOB_SIZE: usize = 8;

/// On-flash record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub led_on: bool,
}

fn decode(bytes: &[u8]) -> Result<bool, StorageError> {
    postcard::from_bytes::<PersistedState>(bytes)
        .map(|s| s.led_on)
        .map_err(|_| StorageError::Corrupted)
}

fn encode(value: bool, buf: &mut [u8; MAX_BLOB_SIZE]) -> Result<&[u8], StorageError> {
    let used = postcard::to_slice(&PersistedState { led_on: value }, buf)
        .map_err(|_| StorageError::IoError)?;
    Ok(&*used)
}

pub struct NvsStore {
    #[cfg(not(target_os = "espidf"))]
    blob: Mutex<RefCell<Option<heapless::Vec<u8, MAX_BLOB_SIZE>>>>,
}

impl NvsStore {
    /// Create the store and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsStore(sim): in-memory backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blob: Mutex::new(RefCell::new(None)),
        })
    }

    /// Overwrite the stored blob with arbitrary bytes.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject_raw(&self, bytes: &[u8]) {
        let blob = heapless::Vec::from_slice(&bytes[..bytes.len().min(MAX_BLOB_SIZE)]).ok();
        critical_section::with(|cs| *self.blob.borrow_ref_mut(cs) = blob);
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(NAMESPACE.as_ptr(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl NonVolatileStore for NvsStore {
    #[cfg(not(target_os = "espidf"))]
    fn load(&self) -> Result<Option<bool>, StorageError> {
        critical_section::with(|cs| match self.blob.borrow_ref(cs).as_deref() {
            Some(bytes) => decode(bytes).map(Some),
            None => Ok(None),
        })
    }

    #[cfg(target_os = "espidf")]
    fn load(&self) -> Result<Option<bool>, StorageError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size = buf.len();
            let ret = unsafe {
                nvs_get_blob(handle, LED_KEY.as_ptr(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });

        match result {
            Ok(size) => decode(&buf[..size]).map(Some),
            // A fresh partition has no namespace yet either.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => {
                warn!("NvsStore: NVS read error {}", e);
                Err(StorageError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn store(&self, value: bool) -> Result<(), StorageError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let bytes = encode(value, &mut buf)?;
        let blob = heapless::Vec::from_slice(bytes).map_err(|_| StorageError::IoError)?;
        critical_section::with(|cs| *self.blob.borrow_ref_mut(cs) = Some(blob));
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn store(&self, value: bool) -> Result<(), StorageError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let bytes = encode(value, &mut buf)?;
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, LED_KEY.as_ptr(), bytes.as_ptr().cast(), bytes.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NvsStore: NVS write error {}", e);
            StorageError::IoError
        })
    }
}
