use crate::types::Arch;

/// Default capacity of the global temporaries region, in bytes. Named
/// after the host compiler's `taichi_global_tmp_buffer_size`; made a
/// config field rather than a hidden global constant (see spec §9).
pub const DEFAULT_GLOBAL_TMP_BUFFER_SIZE: usize = 1024 * 1024;

/// The configuration surface the offload pass reads from. Constructed by
/// the caller (typically projected out of a larger compiler-wide config)
/// and passed by reference through the whole pipeline; this pass never
/// parses CLI flags or env vars itself (out of scope, see spec §1).
#[derive(Debug, Clone)]
pub struct OffloadConfig {
    pub arch: Arch,
    pub saturating_grid_dim: u32,
    pub default_gpu_block_dim: u32,
    pub max_block_dim: u32,
    pub cpu_max_num_threads: u32,
    pub demote_dense_struct_fors: bool,
    pub global_tmp_buffer_size: usize,
}

impl OffloadConfig {
    pub fn new(arch: Arch) -> Self {
        Self {
            arch,
            saturating_grid_dim: 65536,
            default_gpu_block_dim: 256,
            max_block_dim: 1024,
            cpu_max_num_threads: num_cpus_default(),
            demote_dense_struct_fors: true,
            global_tmp_buffer_size: DEFAULT_GLOBAL_TMP_BUFFER_SIZE,
        }
    }

    /// The backend's notion of "default block dim" for the CPU arch,
    /// used by the Offloader whenever a range-for leaves its own block
    /// dim unset. GPU archs use `default_gpu_block_dim` directly; this
    /// hook only covers the platform-dependent CPU case the original
    /// compiler routes through `Program::default_block_dim`.
    pub fn default_block_dim(&self) -> u32 {
        match self.arch {
            Arch::Cpu | Arch::X64 => 32,
            Arch::Cuda | Arch::Metal | Arch::Vulkan => self.default_gpu_block_dim,
        }
    }
}

fn num_cpus_default() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}
