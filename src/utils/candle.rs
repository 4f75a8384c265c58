// src/utils/candle.rs
use anyhow::{Context, Result as AnyhowResult};
use candle_core::{Device, Tensor};
use once_cell::sync::Lazy;

/// Device the embedding model and similarity math run on. Metal, then CUDA,
/// then CPU; whichever the candle build and the host support first.
pub static CANDLE_DEVICE: Lazy<Device> = Lazy::new(|| match Device::new_metal(0) {
    Ok(metal_device) if metal_device.is_metal() => {
        log::info!("Successfully initialized Candle Metal device (GPU).");
        metal_device
    }
    Ok(_) | Err(_) => match Device::cuda_if_available(0) {
        Ok(device) if device.is_cuda() => {
            log::info!("Successfully initialized Candle CUDA device (GPU).");
            device
        }
        Ok(_) => {
            log::info!("Using Candle CPU device.");
            Device::Cpu
        }
        Err(err) => {
            log::warn!(
                "Failed to probe Candle CUDA device: {:?}. Falling back to CPU device.",
                err
            );
            Device::Cpu
        }
    },
});

pub fn cosine_similarity_candle(v1_slice: &[f32], v2_slice: &[f32]) -> AnyhowResult<f64> {
    if v1_slice.len() != v2_slice.len() {
        return Err(anyhow::anyhow!(
            "Input vector lengths differ: {} vs {}",
            v1_slice.len(),
            v2_slice.len()
        ));
    }
    if v1_slice.is_empty() {
        return Err(anyhow::anyhow!("Input vectors must not be empty"));
    }

    let v1 = Tensor::from_slice(v1_slice, (v1_slice.len(),), &CANDLE_DEVICE)
        .with_context(|| format!("Failed to create tensor v1 from slice with len {}", v1_slice.len()))?;
    let v2 = Tensor::from_slice(v2_slice, (v2_slice.len(),), &CANDLE_DEVICE)
        .with_context(|| format!("Failed to create tensor v2 from slice with len {}", v2_slice.len()))?;

    let dot_product = scalar(&(&v1 * &v2).context("Element-wise product failed")?)?;
    let mag1 = scalar(&(&v1 * &v1).context("v1 squared failed")?)?.sqrt();
    let mag2 = scalar(&(&v2 * &v2).context("v2 squared failed")?)?.sqrt();

    if mag1 == 0.0 || mag2 == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot_product / (mag1 * mag2);

    if similarity.is_nan() || similarity.is_infinite() {
        log::warn!(
            "Calculated similarity is NaN or Infinite. dot_product: {}, mag1: {}, mag2: {}",
            dot_product,
            mag1,
            mag2
        );
        return Ok(0.0);
    }

    Ok(similarity)
}

fn scalar(tensor: &Tensor) -> AnyhowResult<f64> {
    let summed = tensor.sum_all().context("Summing tensor failed")?;
    Ok(summed
        .to_scalar::<f32>()
        .context("Converting tensor to scalar failed")? as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_candle() {
        let same = cosine_similarity_candle(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((same - 1.0).abs() < 1e-6);

        let orthogonal = cosine_similarity_candle(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(orthogonal.abs() < 1e-6);

        let opposite = cosine_similarity_candle(&[1.0, 1.0], &[-1.0, -1.0]).unwrap();
        assert!((opposite + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_and_mismatched() {
        assert_eq!(cosine_similarity_candle(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
        assert!(cosine_similarity_candle(&[1.0], &[1.0, 2.0]).is_err());
        assert!(cosine_similarity_candle(&[], &[]).is_err());
    }
}
