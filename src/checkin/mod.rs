pub mod storage;
pub mod types;

pub use storage::{append_check_in, load_data_file, load_many, save_data_file, DATA_FILE_VERSION};
pub use types::{Appetite, CheckIn, DataFile, DeviceReadings, Mobility, Patient, SYMPTOM_FIELDS};
