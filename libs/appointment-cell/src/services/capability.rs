// libs/appointment-cell/src/services/capability.rs
use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{
    AppointmentError, DoctorCapabilities, InsuranceType, PatientType, ReferralOrigin,
    ReferralType, RequestedCapabilities,
};

fn ensure_served(
    served: &BTreeMap<String, bool>,
    key: &str,
    message: &str,
) -> Result<(), AppointmentError> {
    if served.get(key).copied().unwrap_or(false) {
        return Ok(());
    }

    debug!("Capability '{}' not served: {}", key, message);
    Err(AppointmentError::UnsupportedCapability(message.to_string()))
}

pub fn check_patient_type(
    capabilities: &DoctorCapabilities,
    patient_type: PatientType,
) -> Result<(), AppointmentError> {
    ensure_served(
        &capabilities.served_patient_types,
        patient_type.as_str(),
        "The specialist does not support the provided patient type",
    )
}

pub fn check_referral_type(
    capabilities: &DoctorCapabilities,
    referral_type: ReferralType,
) -> Result<(), AppointmentError> {
    ensure_served(
        &capabilities.served_referral_types,
        referral_type.as_str(),
        "The specialist does not support the referral type",
    )
}

pub fn check_referral_origin(
    capabilities: &DoctorCapabilities,
    referral_origin: ReferralOrigin,
) -> Result<(), AppointmentError> {
    ensure_served(
        &capabilities.served_referral_origins,
        referral_origin.as_str(),
        "The specialist does not support the referral origin type",
    )
}

pub fn check_payment_type(
    capabilities: &DoctorCapabilities,
    insurance_type: InsuranceType,
) -> Result<(), AppointmentError> {
    ensure_served(
        &capabilities.served_payment_types,
        insurance_type.as_str(),
        "The specialist does not support the provided insurance type",
    )
}

/// Runs each check whose attribute was supplied, in a fixed order.
pub fn check_requested(
    capabilities: &DoctorCapabilities,
    requested: &RequestedCapabilities,
) -> Result<(), AppointmentError> {
    if let Some(patient_type) = requested.patient_type {
        check_patient_type(capabilities, patient_type)?;
    }
    if let Some(referral_type) = requested.referral_type {
        check_referral_type(capabilities, referral_type)?;
    }
    if let Some(referral_origin) = requested.referral_origin {
        check_referral_origin(capabilities, referral_origin)?;
    }
    if let Some(insurance_type) = requested.insurance_type {
        check_payment_type(capabilities, insurance_type)?;
    }
    Ok(())
}
