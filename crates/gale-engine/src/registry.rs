//! Turbine registry: every descriptor, plus the solvers of the turbines
//! this rank owns.

use gale_core::{LocalIndex, TurbineDescriptor, TurbineId};
use gale_solver::SolverFactory;

use crate::alloc::TurbineAllocation;
use crate::error::{CouplerError, CouplingError};
use crate::exchange::LocalTurbine;

/// Descriptors of the whole farm and the locally owned turbines.
#[derive(Debug)]
pub struct TurbineRegistry {
    descriptors: Vec<TurbineDescriptor>,
    allocation: TurbineAllocation,
    locals: Vec<LocalTurbine>,
}

impl TurbineRegistry {
    /// Create a solver for every turbine `allocation` assigns to this rank.
    pub fn new(
        descriptors: Vec<TurbineDescriptor>,
        allocation: TurbineAllocation,
        factory: &dyn SolverFactory,
    ) -> Result<Self, CouplerError> {
        let mut locals = Vec::with_capacity(allocation.num_local());
        for (local, id) in allocation.local_turbines().iter().enumerate() {
            let d = descriptors
                .get(id.0)
                .ok_or(CouplingError::UnknownTurbine {
                    turbine: *id,
                    n_turbines: descriptors.len(),
                })?
                .clone();
            let solver = factory.create(&d)?;
            locals.push(LocalTurbine::new(d, LocalIndex(local), solver));
        }
        Ok(Self {
            descriptors,
            allocation,
            locals,
        })
    }

    /// Ownership tables.
    pub fn allocation(&self) -> &TurbineAllocation {
        &self.allocation
    }

    /// Descriptor of any turbine in the farm.
    pub fn descriptor(&self, turbine: TurbineId) -> Result<&TurbineDescriptor, CouplingError> {
        self.descriptors
            .get(turbine.0)
            .ok_or(CouplingError::UnknownTurbine {
                turbine,
                n_turbines: self.descriptors.len(),
            })
    }

    /// All descriptors, in global index order.
    pub fn descriptors(&self) -> &[TurbineDescriptor] {
        &self.descriptors
    }

    fn local_index(&self, turbine: TurbineId) -> Result<usize, CouplingError> {
        self.descriptor(turbine)?;
        self.allocation
            .local_index(turbine)
            .map(|l| l.0)
            .ok_or(CouplingError::NotLocallyOwned {
                turbine,
                rank: self.allocation.rank(),
            })
    }

    /// A locally owned turbine.
    pub fn local(&self, turbine: TurbineId) -> Result<&LocalTurbine, CouplingError> {
        let i = self.local_index(turbine)?;
        Ok(&self.locals[i])
    }

    /// A locally owned turbine, mutably.
    pub fn local_mut(&mut self, turbine: TurbineId) -> Result<&mut LocalTurbine, CouplingError> {
        let i = self.local_index(turbine)?;
        Ok(&mut self.locals[i])
    }

    /// Locally owned turbines in local index order.
    pub fn locals(&self) -> &[LocalTurbine] {
        &self.locals
    }

    /// Locally owned turbines in local index order, mutably.
    pub fn locals_mut(&mut self) -> &mut [LocalTurbine] {
        &mut self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gale_core::Rank;
    use gale_solver::SolverError;
    use gale_test_utils::{farm, CallLog, MockConfig, MockSolverFactory};

    fn registry(rank: usize, config: MockConfig) -> Result<TurbineRegistry, CouplerError> {
        let alloc = TurbineAllocation::round_robin(5, 2, Rank(rank)).unwrap();
        let factory = MockSolverFactory::new(config, CallLog::new());
        TurbineRegistry::new(farm(5), alloc, &factory)
    }

    #[test]
    fn locals_follow_allocation() {
        let reg = registry(1, MockConfig::default()).unwrap();
        let ids: Vec<_> = reg.locals().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![TurbineId(1), TurbineId(3)]);
        assert_eq!(reg.local(TurbineId(3)).unwrap().local_index(), LocalIndex(1));
        assert_eq!(reg.descriptors().len(), 5);
    }

    #[test]
    fn foreign_turbine_rejected() {
        let reg = registry(1, MockConfig::default()).unwrap();
        assert!(matches!(
            reg.local(TurbineId(2)),
            Err(CouplingError::NotLocallyOwned {
                turbine: TurbineId(2),
                rank: Rank(1)
            })
        ));
        assert!(reg.descriptor(TurbineId(2)).is_ok());
    }

    #[test]
    fn unknown_turbine_rejected() {
        let reg = registry(0, MockConfig::default()).unwrap();
        assert!(matches!(
            reg.local(TurbineId(9)),
            Err(CouplingError::UnknownTurbine { n_turbines: 5, .. })
        ));
    }

    #[test]
    fn allocation_larger_than_farm_rejected() {
        let alloc = TurbineAllocation::round_robin(6, 1, Rank(0)).unwrap();
        let factory = MockSolverFactory::default();
        assert!(matches!(
            TurbineRegistry::new(farm(5), alloc, &factory),
            Err(CouplerError::Coupling(CouplingError::UnknownTurbine { .. }))
        ));
    }

    #[test]
    fn factory_failure_propagates() {
        let config = MockConfig {
            refuse: vec![TurbineId(4)],
            ..MockConfig::default()
        };
        assert!(matches!(
            registry(0, config),
            Err(CouplerError::Solver(SolverError::Create {
                turbine: TurbineId(4),
                ..
            }))
        ));
    }
}
