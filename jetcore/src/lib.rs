// kinematics module
pub mod kinematics {
    pub mod geometry;
    pub mod lorentz;
}

// data module
pub mod data {
    pub mod particle;
    pub mod lepton;
    pub mod jet;
}

// isolation module
pub mod isolation {
    pub mod constants;
    pub mod cone;
    pub mod correction;
}

// substructure module
pub mod substructure {
    pub mod calibration;
    pub mod category;
    pub mod charge;
    pub mod smearing;
    pub mod subjets;
    pub mod features;
}
