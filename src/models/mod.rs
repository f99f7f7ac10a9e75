mod device;
mod facility;
mod gpu_cluster;
mod inventory;
mod link;
mod port_assignments;
mod settings;
mod topology;

pub use device::*;
pub use facility::*;
pub use gpu_cluster::*;
pub use inventory::*;
pub use link::*;
pub use port_assignments::*;
pub use settings::*;
pub use topology::*;
